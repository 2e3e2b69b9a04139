//! termcanvas - an immediate-mode character canvas for text terminals
//!
//! termcanvas owns the terminal for the lifetime of a [`Session`]: raw mode,
//! the alternate screen and a hidden cursor. Each frame the application polls
//! keys, draws into an off-screen buffer with depth-ordered writes, and
//! renders the whole buffer in one write.
//!
//! # Frame loop
//!
//! ```no_run
//! use termcanvas::{Config, KeyCode, Rect, Session, Vector};
//!
//! fn main() -> termcanvas::Result<()> {
//!     let mut session = Session::prepare(&Config::load())?;
//!     loop {
//!         session.poll_events()?;
//!         if session.is_key_pressed(KeyCode::ESC) {
//!             break;
//!         }
//!         session.clear();
//!         session.draw_rect(Rect::new(Vector::xy(2.0, 1.0), Vector::xy(20.0, 4.0)));
//!         session.draw_text("hello", Vector::new(4.0, 3.0, 1.0));
//!         session.render()?;
//!     }
//!     session.restore();
//!     Ok(())
//! }
//! ```
//!
//! # Key states
//!
//! A key held across N polls reads `PRESSED`, then `HELD` for the polls in
//! between, then `RELEASED` on the poll after it went up, then nothing.

pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod logging;
pub mod ui;

pub use crate::config::{Config, InputMode, ListenerConfig};
pub use crate::core::{FrameBuffer, Rect, Vector};
pub use crate::error::{Error, Result};
pub use crate::input::{KeyCode, KeySource, KeyState, KeyStates, KEY_COUNT};
pub use crate::logging::LogLevel;
pub use crate::ui::{Backend, CrosstermBackend, Session};

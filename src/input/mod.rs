//! Keyboard input.
//!
//! - **keys**: key codes, per-key state flags and the per-poll state machine
//! - **keymap**: terminal key events to bytes / key codes
//! - **source**: the `KeySource` capability
//! - **scan**: synchronous byte scan of the input stream
//! - **listener**: background listener thread feeding a channel
//!
//! Both sources yield the same sequence for a key held across N polls:
//! `PRESSED, HELD, ..., HELD, RELEASED, (none)`.

pub mod keymap;
pub mod keys;
pub mod listener;
pub mod scan;
pub mod source;

pub use keys::{KeyCode, KeyState, KeyStates, KEY_COUNT};
pub use listener::ListenerSource;
pub use scan::ScanSource;
pub use source::KeySource;

use crate::config::{Config, InputMode};

/// Build the key source selected by the configuration.
pub fn source_for(config: &Config) -> Box<dyn KeySource> {
    match config.input {
        InputMode::Scan => Box::new(ScanSource::new()),
        InputMode::Listener => Box::new(ListenerSource::new(config.listener.clone())),
    }
}

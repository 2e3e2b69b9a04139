//! Terminal ownership.
//!
//! - **backend**: the terminal-control collaborator (geometry, raw mode, output)
//! - **session**: the prepare / frame loop / restore lifecycle on top of a backend

pub mod backend;
pub mod session;

pub use backend::{Backend, CrosstermBackend, MemoryBackend, SharedOutput};
pub use session::Session;

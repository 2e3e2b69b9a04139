//! The capability every platform key source provides.

use std::io::Write;

use super::keys::KeyStates;
use crate::error::Result;

/// Produces key input and advances [`KeyStates`] once per poll.
pub trait KeySource: Send {
    /// Hook up to the terminal once raw mode is active.
    fn attach(&mut self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    /// Advance every key record by one poll. Never blocks on input.
    fn poll(&mut self, keys: &mut KeyStates) -> Result<()>;

    /// Undo [`attach`](KeySource::attach). Best effort: failures are logged.
    fn detach(&mut self, _out: &mut dyn Write) {}

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

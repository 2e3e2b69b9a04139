//! Synchronous byte scan of the input stream.
//!
//! Each poll drains whatever input is buffered without waiting. Every byte
//! seen counts as a key that is down during this poll; every other byte code
//! is up. Multi-byte sequences (arrows, function keys, non-ASCII text) mark
//! each of their bytes, so they cannot be told apart from those bytes typed
//! together.

use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};

use super::keymap::ByteMapper;
use super::keys::{DownSet, KeyCode, KeyStates};
use super::source::KeySource;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ScanSource;

impl ScanSource {
    pub fn new() -> Self {
        Self
    }

    /// Read every event that is already buffered.
    fn drain() -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            events.push(event::read()?);
        }
        Ok(events)
    }
}

/// Byte codes delivered by a batch of terminal events.
pub fn down_set<'a>(events: impl IntoIterator<Item = &'a Event>) -> DownSet {
    let mut down = DownSet::new();
    for event in events {
        let bytes = match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => ByteMapper::map(key),
            Event::Paste(text) => Some(text.as_bytes().to_vec()),
            _ => None,
        };
        for b in bytes.into_iter().flatten() {
            down.insert(KeyCode::from_byte(b));
        }
    }
    down
}

impl KeySource for ScanSource {
    fn poll(&mut self, keys: &mut KeyStates) -> Result<()> {
        let events = Self::drain()?;
        keys.advance(&down_set(&events));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode as TermKey, KeyEvent, KeyModifiers};

    fn press(code: TermKey) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_bytes_of_each_event_are_down() {
        let events = [press(TermKey::Char('q')), press(TermKey::Esc)];
        let down = down_set(&events);
        assert!(down.contains(KeyCode::from_byte(b'q')));
        assert!(down.contains(KeyCode::ESC));
        assert!(!down.contains(KeyCode::from_byte(b'w')));
    }

    #[test]
    fn test_escape_sequence_marks_every_byte() {
        let down = down_set(&[press(TermKey::Up)]);
        assert!(down.contains(KeyCode::ESC));
        assert!(down.contains(KeyCode::from_byte(b'[')));
        assert!(down.contains(KeyCode::from_byte(b'A')));
        // No extended key code from the byte scan.
        assert!(!down.contains(KeyCode::UP));
    }

    #[test]
    fn test_backspace_is_delete_byte() {
        let down = down_set(&[press(TermKey::Backspace)]);
        assert!(down.contains(KeyCode::DELETE));
        assert!(!down.contains(KeyCode::BACKSPACE));
    }

    #[test]
    fn test_ignores_non_key_events() {
        let events = [
            Event::FocusGained,
            Event::Resize(80, 24),
            Event::Key(KeyEvent::new_with_kind(
                TermKey::Char('x'),
                KeyModifiers::NONE,
                KeyEventKind::Release,
            )),
        ];
        assert!(down_set(&events).is_empty());
    }

    #[test]
    fn test_repeated_bytes_hold_the_key() {
        let mut keys = KeyStates::new();
        let key = KeyCode::from_byte(b'd');

        keys.advance(&down_set(&[press(TermKey::Char('d'))]));
        assert!(keys.is_pressed(key));
        keys.advance(&down_set(&[press(TermKey::Char('d')), press(TermKey::Char('d'))]));
        assert!(keys.is_held(key));
        keys.advance(&down_set(&[] as &[Event]));
        assert!(keys.is_released(key));
    }
}

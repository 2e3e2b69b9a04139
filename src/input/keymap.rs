//! Translation of terminal key events into this crate's key space.
//!
//! Two views of the same event:
//!
//! - [`ByteMapper`] rebuilds the bytes the terminal put on the input stream,
//!   for the byte-scanning source.
//! - [`translate`] maps the event's key identity through a static table, for
//!   the listener source.

use bitflags::bitflags;
use crossterm::event::{KeyCode as TermKey, KeyEvent, KeyModifiers};

use super::keys::{KeyCode, KEY_COUNT};
use crate::error::{Error, Result};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Maps key events back to the raw bytes a terminal sends for them
pub struct ByteMapper;

impl ByteMapper {
    /// Bytes for a key event, or `None` for keys with no byte encoding.
    pub fn map(event: &KeyEvent) -> Option<Vec<u8>> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            TermKey::Char(ch) => Some(Self::map_char(ch, mods)),
            TermKey::Enter => Some(vec![0x0D]),

            TermKey::Backspace => {
                if mods.contains(Modifiers::ALT) {
                    Some(vec![0x1B, 0x7F])
                } else {
                    Some(vec![0x7F])
                }
            }

            TermKey::Tab => {
                if mods.contains(Modifiers::SHIFT) {
                    Some(b"\x1b[Z".to_vec())
                } else {
                    Some(vec![0x09])
                }
            }
            TermKey::BackTab => Some(b"\x1b[Z".to_vec()),

            TermKey::Esc => Some(vec![0x1B]),

            TermKey::Up => Some(Self::csi_key(b'A', mods)),
            TermKey::Down => Some(Self::csi_key(b'B', mods)),
            TermKey::Right => Some(Self::csi_key(b'C', mods)),
            TermKey::Left => Some(Self::csi_key(b'D', mods)),
            TermKey::Home => Some(Self::csi_key(b'H', mods)),
            TermKey::End => Some(Self::csi_key(b'F', mods)),

            TermKey::PageUp => Some(Self::tilde_key(5, mods)),
            TermKey::PageDown => Some(Self::tilde_key(6, mods)),
            TermKey::Insert => Some(Self::tilde_key(2, mods)),
            TermKey::Delete => Some(Self::tilde_key(3, mods)),

            TermKey::F(n) => Self::function_key(n, mods),

            TermKey::Null => Some(vec![0x00]),

            _ => None,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Vec<u8> {
        let ctrl = mods.contains(Modifiers::CTRL);
        let alt = mods.contains(Modifiers::ALT);

        if ctrl {
            let code = if ch.is_ascii_alphabetic() {
                Some((ch.to_ascii_lowercase() as u8) - b'a' + 1)
            } else {
                match ch {
                    '@' | '`' | ' ' => Some(0x00),
                    '[' => Some(0x1B),
                    '\\' => Some(0x1C),
                    ']' => Some(0x1D),
                    '^' | '~' => Some(0x1E),
                    '_' | '?' => Some(0x1F),
                    _ => None,
                }
            };

            if let Some(code) = code {
                return if alt { vec![0x1B, code] } else { vec![code] };
            }
        }

        let mut buf = [0u8; 4];
        let encoded = ch.encode_utf8(&mut buf).as_bytes();
        if alt {
            let mut bytes = vec![0x1B];
            bytes.extend_from_slice(encoded);
            bytes
        } else {
            encoded.to_vec()
        }
    }

    /// `ESC [ <key>` or `ESC [ 1 ; <mod> <key>`
    fn csi_key(key: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            vec![0x1B, b'[', key]
        } else {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        }
    }

    /// `ESC [ <code> ~` or `ESC [ <code> ; <mod> ~`
    fn tilde_key(code: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            format!("\x1b[{}~", code).into_bytes()
        } else {
            format!("\x1b[{};{}~", code, Self::modifier_code(mods)).into_bytes()
        }
    }

    fn function_key(n: u8, mods: Modifiers) -> Option<Vec<u8>> {
        match n {
            1..=4 => {
                let key = b"PQRS"[n as usize - 1];
                if mods.is_empty() {
                    Some(vec![0x1B, b'O', key])
                } else {
                    Some(Self::csi_key(key, mods))
                }
            }
            5..=12 => {
                const CODES: [u8; 8] = [15, 17, 18, 19, 20, 21, 23, 24];
                Some(Self::tilde_key(CODES[n as usize - 5], mods))
            }
            _ => None,
        }
    }

    /// Calculate xterm modifier code
    fn modifier_code(mods: Modifiers) -> u8 {
        1 + if mods.contains(Modifiers::SHIFT) { 1 } else { 0 }
            + if mods.contains(Modifiers::ALT) { 2 } else { 0 }
            + if mods.contains(Modifiers::CTRL) { 4 } else { 0 }
    }
}

/// Keys that are not characters.
static NAMED_KEYS: &[(TermKey, KeyCode)] = &[
    (TermKey::Backspace, KeyCode::BACKSPACE),
    (TermKey::Tab, KeyCode::TAB),
    (TermKey::Enter, KeyCode::ENTER),
    (TermKey::Esc, KeyCode::ESC),
    (TermKey::Delete, KeyCode::DELETE),
    (TermKey::Up, KeyCode::UP),
    (TermKey::Down, KeyCode::DOWN),
    (TermKey::Left, KeyCode::LEFT),
    (TermKey::Right, KeyCode::RIGHT),
    (TermKey::Home, KeyCode::HOME),
    (TermKey::End, KeyCode::END),
    (TermKey::PageUp, KeyCode::PAGE_UP),
    (TermKey::PageDown, KeyCode::PAGE_DOWN),
    (TermKey::Insert, KeyCode::INSERT),
    (TermKey::BackTab, KeyCode::BACK_TAB),
];

/// Key identity of a terminal key, or `None` when it has no mapping.
///
/// Letters map to their lowercase code so that a key keeps one identity
/// whether or not shift was down when it was pressed or released.
pub fn translate(code: TermKey) -> Option<KeyCode> {
    match code {
        TermKey::Char(ch) => KeyCode::from_char(ch.to_ascii_lowercase()),
        TermKey::F(n) => KeyCode::function(n),
        other => NAMED_KEYS
            .iter()
            .find(|(term, _)| *term == other)
            .map(|(_, key)| *key),
    }
}

/// Check the named-key table: targets in range, no two keys sharing a code.
pub fn validate_table() -> Result<()> {
    let mut seen = [false; KEY_COUNT];
    for (term, key) in NAMED_KEYS {
        if key.index() >= KEY_COUNT {
            return Err(Error::Listener(format!(
                "{:?} maps outside the key space ({})",
                term,
                key.code()
            )));
        }
        if std::mem::replace(&mut seen[key.index()], true) {
            return Err(Error::Listener(format!(
                "{:?} maps to {:?}, which is already taken",
                term, key
            )));
        }
    }
    for n in 1..=12 {
        match KeyCode::function(n) {
            Some(key) if !seen[key.index()] => seen[key.index()] = true,
            _ => return Err(Error::Listener(format!("F{} has no free key code", n))),
        }
    }
    Ok(())
}

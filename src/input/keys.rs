//! Key codes and the per-key press/hold/release state machine.

use std::fmt;

use bitflags::bitflags;

/// Number of representable key codes.
pub const KEY_COUNT: usize = 512;

/// A key in this crate's key space.
///
/// Codes `0..=255` are raw byte values (ASCII characters and control codes);
/// codes from [`KeyCode::EXTENDED`] upward name keys that have no single-byte
/// form and are only produced by the listener source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(u16);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(13);
    pub const ESC: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const DELETE: KeyCode = KeyCode(127);

    /// First code above the byte range.
    pub const EXTENDED: u16 = 256;

    pub const UP: KeyCode = KeyCode(256);
    pub const DOWN: KeyCode = KeyCode(257);
    pub const LEFT: KeyCode = KeyCode(258);
    pub const RIGHT: KeyCode = KeyCode(259);
    pub const HOME: KeyCode = KeyCode(260);
    pub const END: KeyCode = KeyCode(261);
    pub const PAGE_UP: KeyCode = KeyCode(262);
    pub const PAGE_DOWN: KeyCode = KeyCode(263);
    pub const INSERT: KeyCode = KeyCode(264);
    pub const BACK_TAB: KeyCode = KeyCode(265);

    /// Function key `F1`..=`F12`.
    pub const fn function(n: u8) -> Option<KeyCode> {
        if n >= 1 && n <= 12 {
            Some(KeyCode(270 + n as u16 - 1))
        } else {
            None
        }
    }

    /// Key code for a raw byte.
    pub const fn from_byte(b: u8) -> KeyCode {
        KeyCode(b as u16)
    }

    /// Key code for a character, if it lies in the byte range.
    pub fn from_char(c: char) -> Option<KeyCode> {
        u8::try_from(c).ok().map(KeyCode::from_byte)
    }

    /// Key code from a raw index, if it is inside the key space.
    pub fn new(code: u16) -> Option<KeyCode> {
        ((code as usize) < KEY_COUNT).then_some(KeyCode(code))
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The character this key stands for when it is in the byte range.
    pub fn as_char(self) -> Option<char> {
        u8::try_from(self.0).ok().map(char::from)
    }

    pub fn is_control(self) -> bool {
        self.as_char().map_or(true, |c| c.is_ascii_control())
    }
}

impl From<u8> for KeyCode {
    fn from(b: u8) -> Self {
        KeyCode::from_byte(b)
    }
}

impl fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) if c.is_ascii_graphic() => write!(f, "KeyCode({:?})", c),
            _ => write!(f, "KeyCode({})", self.0),
        }
    }
}

bitflags! {
    /// Per-key state flags. At most one is set at a time.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct KeyState: u8 {
        const PRESSED  = 0b0001;
        const HELD     = 0b0010;
        const RELEASED = 0b0100;
    }
}

impl KeyState {
    /// Advance one poll given whether the key is down now.
    ///
    /// | previous          | up       | down    |
    /// |-------------------|----------|---------|
    /// | none / released   | none     | pressed |
    /// | pressed           | released | held    |
    /// | held              | released | held    |
    pub fn advance(self, down: bool) -> KeyState {
        let was_down = self.intersects(KeyState::PRESSED | KeyState::HELD);
        match (was_down, down) {
            (false, false) => KeyState::empty(),
            (false, true) => KeyState::PRESSED,
            (true, false) => KeyState::RELEASED,
            (true, true) => KeyState::HELD,
        }
    }

    /// Age the state by one poll without new input: pressed becomes held and
    /// released becomes none.
    pub fn decay(self) -> KeyState {
        if self.contains(KeyState::PRESSED) {
            KeyState::HELD
        } else if self.contains(KeyState::RELEASED) {
            KeyState::empty()
        } else {
            self
        }
    }
}

/// Set of keys seen down during one poll.
#[derive(Clone)]
pub struct DownSet([bool; KEY_COUNT]);

impl Default for DownSet {
    fn default() -> Self {
        Self([false; KEY_COUNT])
    }
}

impl DownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: KeyCode) {
        self.0[key.index()] = true;
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        self.0[key.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|down| *down)
    }
}

impl FromIterator<KeyCode> for DownSet {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        let mut set = DownSet::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl fmt::Debug for DownSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = (0..KEY_COUNT as u16)
            .map(KeyCode)
            .filter(|k| self.contains(*k));
        f.debug_set().entries(keys).finish()
    }
}

/// One state record per key code.
#[derive(Clone)]
pub struct KeyStates {
    keys: [KeyState; KEY_COUNT],
}

impl Default for KeyStates {
    fn default() -> Self {
        Self {
            keys: [KeyState::empty(); KEY_COUNT],
        }
    }
}

impl fmt::Debug for KeyStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .map(|(i, s)| (KeyCode(i as u16), *s));
        f.debug_map().entries(active).finish()
    }
}

impl KeyStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: KeyCode) -> KeyState {
        self.keys[key.index()]
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.get(key).contains(KeyState::PRESSED)
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.get(key).contains(KeyState::HELD)
    }

    pub fn is_released(&self, key: KeyCode) -> bool {
        self.get(key).contains(KeyState::RELEASED)
    }

    /// Advance every key from a snapshot of the keys that are down now.
    pub fn advance(&mut self, down: &DownSet) {
        for (i, state) in self.keys.iter_mut().enumerate() {
            *state = state.advance(down.0[i]);
        }
    }

    /// Age every key by one poll (listener variant).
    pub fn decay(&mut self) {
        for state in self.keys.iter_mut() {
            *state = state.decay();
        }
    }

    /// Record a key-down event. Keys already down stay as they are.
    pub fn press(&mut self, key: KeyCode) {
        let state = &mut self.keys[key.index()];
        if !state.intersects(KeyState::PRESSED | KeyState::HELD) {
            *state = KeyState::PRESSED;
        }
    }

    /// Record a key-up event.
    pub fn release(&mut self, key: KeyCode) {
        let state = &mut self.keys[key.index()];
        if state.intersects(KeyState::PRESSED | KeyState::HELD) {
            *state = KeyState::RELEASED;
        }
    }

    /// Keys pressed this poll, in ascending code order.
    pub fn pressed(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, s)| s.contains(KeyState::PRESSED))
            .map(|(i, _)| KeyCode(i as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        let none = KeyState::empty();
        assert_eq!(none.advance(false), none);
        assert_eq!(none.advance(true), KeyState::PRESSED);
        assert_eq!(KeyState::RELEASED.advance(false), none);
        assert_eq!(KeyState::RELEASED.advance(true), KeyState::PRESSED);
        assert_eq!(KeyState::PRESSED.advance(false), KeyState::RELEASED);
        assert_eq!(KeyState::PRESSED.advance(true), KeyState::HELD);
        assert_eq!(KeyState::HELD.advance(false), KeyState::RELEASED);
        assert_eq!(KeyState::HELD.advance(true), KeyState::HELD);
    }

    #[test]
    fn test_hold_lifecycle() {
        let key = KeyCode::from_byte(b'w');
        let mut keys = KeyStates::new();
        let mut seen = Vec::new();

        for down in [true, true, true, false, false] {
            let snapshot: DownSet = down.then_some(key).into_iter().collect();
            keys.advance(&snapshot);
            seen.push(keys.get(key));
        }

        assert_eq!(
            seen,
            vec![
                KeyState::PRESSED,
                KeyState::HELD,
                KeyState::HELD,
                KeyState::RELEASED,
                KeyState::empty(),
            ]
        );
    }

    #[test]
    fn test_event_lifecycle_matches_snapshot_lifecycle() {
        let key = KeyCode::ESC;
        let mut keys = KeyStates::new();
        let mut seen = Vec::new();

        // Events arrive between polls: down before poll 1, up before poll 4.
        for poll in 0..5 {
            keys.decay();
            match poll {
                0 => keys.press(key),
                3 => keys.release(key),
                _ => {}
            }
            seen.push(keys.get(key));
        }

        assert_eq!(
            seen,
            vec![
                KeyState::PRESSED,
                KeyState::HELD,
                KeyState::HELD,
                KeyState::RELEASED,
                KeyState::empty(),
            ]
        );
    }

    #[test]
    fn test_queries() {
        let mut keys = KeyStates::new();
        keys.advance(&[KeyCode::ESC].into_iter().collect());
        assert!(keys.is_pressed(KeyCode::ESC));
        assert!(!keys.is_held(KeyCode::ESC));
        assert!(!keys.is_released(KeyCode::ESC));
        assert!(!keys.is_pressed(KeyCode::ENTER));
    }

    #[test]
    fn test_pressed_enumeration() {
        let mut keys = KeyStates::new();
        keys.advance(&[KeyCode::from_byte(b'b')].into_iter().collect());
        keys.advance(
            &[b'b', b'z', b'a']
                .into_iter()
                .map(KeyCode::from_byte)
                .chain([KeyCode::UP])
                .collect(),
        );

        // 'b' is held now, not pressed.
        let pressed: Vec<_> = keys.pressed().collect();
        assert_eq!(
            pressed,
            vec![KeyCode::from_byte(b'a'), KeyCode::from_byte(b'z'), KeyCode::UP]
        );
        // Restartable.
        assert_eq!(keys.pressed().count(), 3);
    }

    #[test]
    fn test_key_code_ranges() {
        assert_eq!(KeyCode::from_char('a'), Some(KeyCode::from_byte(97)));
        assert_eq!(KeyCode::from_char('é'), Some(KeyCode::from_byte(0xE9)));
        assert_eq!(KeyCode::from_char('─'), None);
        assert_eq!(KeyCode::function(1), Some(KeyCode::new(270).unwrap()));
        assert_eq!(KeyCode::function(13), None);
        assert!(KeyCode::new(KEY_COUNT as u16).is_none());
        assert!(KeyCode::ESC.is_control());
        assert!(KeyCode::UP.is_control());
        assert!(!KeyCode::from_byte(b'q').is_control());
    }
}

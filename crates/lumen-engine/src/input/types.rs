use std::fmt;

/// Logical key identifier.
///
/// Printable keys are reported as [`Key::Char`] with the layout-dependent
/// character (so shift+8 on a US layout is `Char('*')`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    Char(char),

    /// F1..=F12.
    Function(u8),

    /// Platform key code not represented here.
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// One key transition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub state: KeyState,
    /// Physical key code when available.
    pub code: u32,
    /// True for auto-repeat presses.
    pub repeat: bool,
    /// Text produced by the press, if any.
    pub text: Option<String>,
}

impl KeyEvent {
    /// Single-character identifier of a press: the produced text when it is
    /// one character, otherwise the logical character.
    pub fn identifier(&self) -> Option<char> {
        if let Some(text) = &self.text {
            let mut chars = text.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Some(c);
            }
        }
        match self.key {
            Key::Char(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_press(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "'{c}'"),
            Key::Function(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: Key, text: Option<&str>) -> KeyEvent {
        KeyEvent {
            key,
            state: KeyState::Pressed,
            code: 0,
            repeat: false,
            text: text.map(str::to_owned),
        }
    }

    #[test]
    fn identifier_prefers_single_char_text() {
        assert_eq!(press(Key::Char('8'), Some("*")).identifier(), Some('*'));
        assert_eq!(press(Key::Char('r'), None).identifier(), Some('r'));
        assert_eq!(press(Key::Tab, Some("\t")).identifier(), Some('\t'));
        assert_eq!(press(Key::Escape, None).identifier(), None);
    }

    #[test]
    fn multi_char_text_falls_back_to_key() {
        assert_eq!(press(Key::Char('e'), Some("ab")).identifier(), Some('e'));
    }
}

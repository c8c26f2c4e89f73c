//! Key identifier → viewer action.

use lumen_engine::paint::Color;

use crate::render_mode::RenderMode;

/// What a keypress asks the application to do.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum KeyAction {
    SetClearColor(Color),
    RandomClearColor,
    /// Log the clear color as `#rrggbb`.
    QueryClearColor,
    SelectMode(RenderMode),
    NextMode,
}

/// Clear-color keys.
pub const COLOR_KEYS: [(char, Color); 8] = [
    ('k', Color::BLACK),
    ('r', Color::RED),
    ('y', Color::YELLOW),
    ('g', Color::GREEN),
    ('c', Color::CYAN),
    ('b', Color::BLUE),
    ('m', Color::MAGENTA),
    ('w', Color::WHITE),
];

/// Maps one key identifier; unmapped keys give `None`.
pub fn action_for(key: char) -> Option<KeyAction> {
    match key {
        '*' => Some(KeyAction::RandomClearColor),
        '?' => Some(KeyAction::QueryClearColor),
        '\t' => Some(KeyAction::NextMode),
        '1'..='9' => {
            let position = key.to_digit(10)? as usize;
            RenderMode::from_position(position).map(KeyAction::SelectMode)
        }
        _ => COLOR_KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, color)| KeyAction::SetClearColor(*color)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_keys_map_to_palette() {
        assert_eq!(action_for('r'), Some(KeyAction::SetClearColor(Color::RED)));
        assert_eq!(action_for('k'), Some(KeyAction::SetClearColor(Color::BLACK)));
        assert_eq!(action_for('R'), None, "color keys are case sensitive");
    }

    #[test]
    fn digits_select_modes_in_order() {
        assert_eq!(action_for('1'), Some(KeyAction::SelectMode(RenderMode::Triangles)));
        assert_eq!(action_for('7'), Some(KeyAction::SelectMode(RenderMode::TriangleFan)));
        assert_eq!(action_for('8'), None);
        assert_eq!(action_for('0'), None);
    }

    #[test]
    fn special_keys() {
        assert_eq!(action_for('*'), Some(KeyAction::RandomClearColor));
        assert_eq!(action_for('?'), Some(KeyAction::QueryClearColor));
        assert_eq!(action_for('\t'), Some(KeyAction::NextMode));
        assert_eq!(action_for('x'), None);
    }
}

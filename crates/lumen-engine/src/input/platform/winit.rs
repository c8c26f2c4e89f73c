use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey, PhysicalKey};

use crate::input::{Key, KeyEvent, KeyState};

/// Translates a winit keyboard `WindowEvent` into an engine `KeyEvent`.
///
/// Returns `None` for every other event.
pub(crate) fn translate_key_event(event: &WindowEvent) -> Option<KeyEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let key_state = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };
            let code = match event.physical_key {
                PhysicalKey::Code(code) => code as u32,
                PhysicalKey::Unidentified(_) => 0,
            };

            Some(KeyEvent {
                key: map_key(&event.logical_key, code),
                state: key_state,
                code,
                repeat: event.repeat,
                text: event.text.as_ref().map(|t| t.to_string()),
            })
        }

        _ => None,
    }
}

fn map_key(key: &WinitKey, code: u32) -> Key {
    match key {
        WinitKey::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c),
                _ => Key::Unknown(code),
            }
        }
        WinitKey::Named(named) => match named {
            NamedKey::Escape => Key::Escape,
            NamedKey::Enter => Key::Enter,
            NamedKey::Tab => Key::Tab,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Space => Key::Space,

            NamedKey::ArrowUp => Key::ArrowUp,
            NamedKey::ArrowDown => Key::ArrowDown,
            NamedKey::ArrowLeft => Key::ArrowLeft,
            NamedKey::ArrowRight => Key::ArrowRight,

            NamedKey::Shift => Key::Shift,
            NamedKey::Control => Key::Control,
            NamedKey::Alt => Key::Alt,
            NamedKey::Super | NamedKey::Meta => Key::Meta,

            NamedKey::F1 => Key::Function(1),
            NamedKey::F2 => Key::Function(2),
            NamedKey::F3 => Key::Function(3),
            NamedKey::F4 => Key::Function(4),
            NamedKey::F5 => Key::Function(5),
            NamedKey::F6 => Key::Function(6),
            NamedKey::F7 => Key::Function(7),
            NamedKey::F8 => Key::Function(8),
            NamedKey::F9 => Key::Function(9),
            NamedKey::F10 => Key::Function(10),
            NamedKey::F11 => Key::Function(11),
            NamedKey::F12 => Key::Function(12),

            _ => Key::Unknown(code),
        },
        _ => Key::Unknown(code),
    }
}

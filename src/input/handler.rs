use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move(Direction),
    Restart,
    Quit,
    None,
}

/// Maps terminal key events to game actions. Letters match regardless of
/// case; unknown keys map to [`KeyAction::None`].
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Up => KeyAction::Move(Direction::Up),
            KeyCode::Down => KeyAction::Move(Direction::Down),
            KeyCode::Left => KeyAction::Move(Direction::Left),
            KeyCode::Right => KeyAction::Move(Direction::Right),
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'w' => KeyAction::Move(Direction::Up),
                's' => KeyAction::Move(Direction::Down),
                'a' => KeyAction::Move(Direction::Left),
                'd' => KeyAction::Move(Direction::Right),
                'r' => KeyAction::Restart,
                'q' => KeyAction::Quit,
                _ => KeyAction::None,
            },
            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

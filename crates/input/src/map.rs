//! Key mapping from terminal key codes to commands.

use crossterm::event::KeyCode;

use crate::types::{Command, Direction};

/// Map a physical key to its base command.
///
/// Exactly eight keys are bound; letter keys match in either case so Shift
/// does not swallow input.
pub fn map_key(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Left => Some(Command::MoveLeft),
        KeyCode::Right => Some(Command::MoveRight),
        KeyCode::Down => Some(Command::SoftDrop),
        KeyCode::Char(' ') => Some(Command::HardDrop),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::RotateCw),
        KeyCode::Char('z') | KeyCode::Char('Z') => Some(Command::RotateCcw),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::Rotate180),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::HoldPiece),
        _ => None,
    }
}

/// Direction of a key that participates in auto-repeat.
pub fn direction_of(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_keys() {
        assert_eq!(map_key(KeyCode::Left), Some(Command::MoveLeft));
        assert_eq!(map_key(KeyCode::Right), Some(Command::MoveRight));
        assert_eq!(map_key(KeyCode::Down), Some(Command::SoftDrop));
        assert_eq!(map_key(KeyCode::Char(' ')), Some(Command::HardDrop));
    }

    #[test]
    fn test_rotation_keys() {
        assert_eq!(map_key(KeyCode::Char('x')), Some(Command::RotateCw));
        assert_eq!(map_key(KeyCode::Char('z')), Some(Command::RotateCcw));
        assert_eq!(map_key(KeyCode::Char('a')), Some(Command::Rotate180));
        assert_eq!(map_key(KeyCode::Char('X')), Some(Command::RotateCw));
        assert_eq!(map_key(KeyCode::Char('Z')), Some(Command::RotateCcw));
    }

    #[test]
    fn test_hold_and_unmapped_keys() {
        assert_eq!(map_key(KeyCode::Char('c')), Some(Command::HoldPiece));
        assert_eq!(map_key(KeyCode::Up), None);
        assert_eq!(map_key(KeyCode::Char('q')), None);
        assert_eq!(map_key(KeyCode::Enter), None);
    }

    #[test]
    fn test_only_horizontal_keys_have_direction() {
        assert_eq!(direction_of(KeyCode::Left), Some(Direction::Left));
        assert_eq!(direction_of(KeyCode::Right), Some(Direction::Right));
        assert_eq!(direction_of(KeyCode::Down), None);
        assert_eq!(direction_of(KeyCode::Char('x')), None);
    }
}

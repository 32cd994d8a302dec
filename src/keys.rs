//! Key bindings of the interactive viewer.

use crossterm::event::KeyCode;

/// What a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    JumpStartX,
    JumpEndX,
    JumpStartY,
    JumpEndY,
    RaiseThreshold,
    LowerThreshold,
    Quit,
}

/// State of the two-key `g g` chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chord {
    #[default]
    Idle,
    AwaitingSecondKey,
}

/// Translates key presses into commands, tracking the chord in between.
#[derive(Debug, Default)]
pub struct KeyMap {
    chord: Chord,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chord(&self) -> Chord {
        self.chord
    }

    /// Drop a pending chord, as any non-`g` event does.
    pub fn reset(&mut self) {
        self.chord = Chord::Idle;
    }

    /// Feed one key press. Any key other than `g` cancels a pending chord.
    pub fn feed(&mut self, code: KeyCode) -> Option<Command> {
        if code == KeyCode::Char('g') {
            return match self.chord {
                Chord::Idle => {
                    self.chord = Chord::AwaitingSecondKey;
                    None
                }
                Chord::AwaitingSecondKey => {
                    self.chord = Chord::Idle;
                    Some(Command::JumpStartY)
                }
            };
        }
        self.chord = Chord::Idle;

        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),

            // Arrows, WASD and hjkl
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('h') => {
                Some(Command::PanLeft)
            }
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('l') => {
                Some(Command::PanRight)
            }
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Char('k') => {
                Some(Command::PanUp)
            }
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('j') => {
                Some(Command::PanDown)
            }

            // vim-style edges: 0 ^ $ G (and gg above)
            KeyCode::Char('^') | KeyCode::Char('0') | KeyCode::Home => Some(Command::JumpStartX),
            KeyCode::Char('$') | KeyCode::End => Some(Command::JumpEndX),
            KeyCode::Char('G') => Some(Command::JumpEndY),

            KeyCode::Char('+') => Some(Command::RaiseThreshold),
            KeyCode::Char('-') => Some(Command::LowerThreshold),

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gg_chord() {
        let mut keys = KeyMap::new();
        assert_eq!(keys.feed(KeyCode::Char('g')), None);
        assert_eq!(keys.chord(), Chord::AwaitingSecondKey);
        assert_eq!(keys.feed(KeyCode::Char('g')), Some(Command::JumpStartY));
        assert_eq!(keys.chord(), Chord::Idle);
    }

    #[test]
    fn test_other_key_cancels_chord() {
        let mut keys = KeyMap::new();
        keys.feed(KeyCode::Char('g'));
        assert_eq!(keys.feed(KeyCode::Char('x')), None);
        assert_eq!(keys.chord(), Chord::Idle);
        assert_eq!(keys.feed(KeyCode::Char('g')), None);
        assert_eq!(keys.feed(KeyCode::Right), Some(Command::PanRight));
        assert_eq!(keys.feed(KeyCode::Char('g')), None);
    }

    #[test]
    fn test_reset_cancels_chord() {
        let mut keys = KeyMap::new();
        keys.feed(KeyCode::Char('g'));
        keys.reset();
        assert_eq!(keys.chord(), Chord::Idle);
        assert_eq!(keys.feed(KeyCode::Char('g')), None);
    }

    #[test]
    fn test_bindings() {
        let mut keys = KeyMap::new();
        for code in [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A'), KeyCode::Char('h')] {
            assert_eq!(keys.feed(code), Some(Command::PanLeft));
        }
        for code in [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S'), KeyCode::Char('j')] {
            assert_eq!(keys.feed(code), Some(Command::PanDown));
        }
        assert_eq!(keys.feed(KeyCode::Char('Q')), Some(Command::Quit));
        assert_eq!(keys.feed(KeyCode::Char('$')), Some(Command::JumpEndX));
        assert_eq!(keys.feed(KeyCode::Char('0')), Some(Command::JumpStartX));
        assert_eq!(keys.feed(KeyCode::Char('G')), Some(Command::JumpEndY));
        assert_eq!(keys.feed(KeyCode::Char('-')), Some(Command::LowerThreshold));
    }
}

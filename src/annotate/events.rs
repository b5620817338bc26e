//! Input vocabulary of the annotation loop.
//!
//! The window only reports polled state (button held, cursor position),
//! so `PointerTracker` turns successive samples into press/move/release
//! events.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left button: freehand label strokes
    Primary,
    /// Right button: selection rectangle
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press { button: Button, x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Release { button: Button, x: i32, y: i32 },
}

/// Pointer state as polled once per loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerSample {
    /// Cursor position in image pixels, `None` when unknown
    pub pos: Option<(i32, i32)>,
    pub primary: bool,
    pub secondary: bool,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    last: PointerSample,
    last_pos: Option<(i32, i32)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `sample` against the previous one. Presses come first, then a
    /// move if the cursor changed position, then releases.
    pub fn update(&mut self, sample: PointerSample) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let Some((x, y)) = sample.pos.or(self.last_pos) else {
            self.last = sample;
            return events;
        };

        let buttons = [
            (Button::Primary, self.last.primary, sample.primary),
            (Button::Secondary, self.last.secondary, sample.secondary),
        ];

        for (button, was, now) in buttons {
            if now && !was {
                events.push(PointerEvent::Press { button, x, y });
            }
        }
        if self.last_pos.is_some_and(|p| p != (x, y)) {
            events.push(PointerEvent::Move { x, y });
        }
        for (button, was, now) in buttons {
            if was && !now {
                events.push(PointerEvent::Release { button, x, y });
            }
        }

        self.last = sample;
        self.last_pos = Some((x, y));
        events
    }
}

/// Keyboard commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `0`: strokes mark sure background
    DrawBackground,
    /// `1`: strokes mark sure foreground
    DrawForeground,
    /// `n`: one segmentation pass
    Segment,
    /// `s`: render, show and save the whiteboard
    Save,
    /// Esc
    Exit,
}

impl Command {
    /// Case-sensitive: `N` and `S` are not bound.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Command::DrawBackground),
            '1' => Some(Command::DrawForeground),
            'n' => Some(Command::Segment),
            's' => Some(Command::Save),
            '\u{1b}' => Some(Command::Exit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pos: (i32, i32), primary: bool, secondary: bool) -> PointerSample {
        PointerSample {
            pos: Some(pos),
            primary,
            secondary,
        }
    }

    #[test]
    fn test_drag_sequence() {
        let mut tracker = PointerTracker::new();
        assert!(tracker.update(sample((5, 5), false, false)).is_empty());

        assert_eq!(
            tracker.update(sample((5, 5), false, true)),
            vec![PointerEvent::Press {
                button: Button::Secondary,
                x: 5,
                y: 5
            }]
        );
        assert_eq!(
            tracker.update(sample((9, 12), false, true)),
            vec![PointerEvent::Move { x: 9, y: 12 }]
        );
        assert!(tracker.update(sample((9, 12), false, true)).is_empty());
        assert_eq!(
            tracker.update(sample((9, 12), false, false)),
            vec![PointerEvent::Release {
                button: Button::Secondary,
                x: 9,
                y: 12
            }]
        );
    }

    #[test]
    fn test_press_move_release_in_one_sample_order() {
        let mut tracker = PointerTracker::new();
        tracker.update(sample((0, 0), false, true));

        let events = tracker.update(sample((3, 4), true, false));
        assert_eq!(
            events,
            vec![
                PointerEvent::Press {
                    button: Button::Primary,
                    x: 3,
                    y: 4
                },
                PointerEvent::Move { x: 3, y: 4 },
                PointerEvent::Release {
                    button: Button::Secondary,
                    x: 3,
                    y: 4
                },
            ]
        );
    }

    #[test]
    fn test_unknown_position_reuses_last() {
        let mut tracker = PointerTracker::new();
        tracker.update(sample((7, 8), true, false));

        let events = tracker.update(PointerSample {
            pos: None,
            primary: false,
            secondary: false,
        });
        assert_eq!(
            events,
            vec![PointerEvent::Release {
                button: Button::Primary,
                x: 7,
                y: 8
            }]
        );
    }

    #[test]
    fn test_no_position_ever_yields_nothing() {
        let mut tracker = PointerTracker::new();
        let events = tracker.update(PointerSample {
            pos: None,
            primary: true,
            secondary: false,
        });
        assert!(events.is_empty());
    }

    #[test]
    fn test_command_keys() {
        assert_eq!(Command::from_char('0'), Some(Command::DrawBackground));
        assert_eq!(Command::from_char('1'), Some(Command::DrawForeground));
        assert_eq!(Command::from_char('n'), Some(Command::Segment));
        assert_eq!(Command::from_char('s'), Some(Command::Save));
        assert_eq!(Command::from_char('\u{1b}'), Some(Command::Exit));
        assert_eq!(Command::from_char('N'), None);
        assert_eq!(Command::from_char('S'), None);
        assert_eq!(Command::from_char('x'), None);
    }
}

pub mod events;

pub use events::{Button, Command, PointerEvent, PointerSample, PointerTracker};

use crate::state::mask::{Label, SelectionRect};
use crate::state::ImageState;

/// Default brush radius in pixels
pub const DEFAULT_THICKNESS: i32 = 2;

/// Selection rectangle drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectTool {
    Idle,
    Dragging {
        anchor: (i32, i32),
        /// A previous drag already reached `Committed`
        committed_before: bool,
    },
    Committed,
}

impl RectTool {
    /// Whether any rectangle has been committed this session
    pub fn has_committed(&self) -> bool {
        match self {
            RectTool::Idle => false,
            RectTool::Dragging {
                committed_before, ..
            } => *committed_before,
            RectTool::Committed => true,
        }
    }
}

/// Freehand label strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushTool {
    Idle,
    Drawing,
}

/// Turns pointer events into rectangle and label edits on an `ImageState`
pub struct AnnotationController {
    draw_label: Label,
    thickness: i32,
    rect: RectTool,
    brush: BrushTool,
}

impl AnnotationController {
    pub fn new(thickness: i32) -> Self {
        Self {
            draw_label: Label::Foreground,
            thickness,
            rect: RectTool::Idle,
            brush: BrushTool::Idle,
        }
    }

    pub fn draw_label(&self) -> Label {
        self.draw_label
    }

    pub fn thickness(&self) -> i32 {
        self.thickness
    }

    #[cfg(test)]
    pub fn rect_tool(&self) -> RectTool {
        self.rect
    }

    #[cfg(test)]
    pub fn brush_tool(&self) -> BrushTool {
        self.brush
    }

    /// Pick the label for future strokes. Existing marks keep their colour.
    pub fn set_draw_label(&mut self, is_foreground: bool) {
        self.draw_label = if is_foreground {
            Label::Foreground
        } else {
            Label::Background
        };
        tracing::info!(
            "Use left mouse button for {}",
            if is_foreground { "FG" } else { "BG" }
        );
    }

    /// Feed one event to both state machines
    pub fn handle(&mut self, event: PointerEvent, state: &mut ImageState) {
        self.handle_rect(event, state);
        self.handle_brush(event, state);
    }

    fn handle_rect(&mut self, event: PointerEvent, state: &mut ImageState) {
        match (self.rect, event) {
            (
                _,
                PointerEvent::Press {
                    button: Button::Secondary,
                    x,
                    y,
                },
            ) => {
                self.rect = RectTool::Dragging {
                    anchor: (x, y),
                    committed_before: self.rect.has_committed(),
                };
            }
            (RectTool::Dragging { anchor, .. }, PointerEvent::Move { x, y }) => {
                state.preview_rect(SelectionRect::from_corners(anchor, (x, y)));
            }
            (
                RectTool::Dragging { anchor, .. },
                PointerEvent::Release {
                    button: Button::Secondary,
                    x,
                    y,
                },
            ) => {
                let rect = SelectionRect::from_corners(anchor, (x, y));
                state.commit_rect(rect);
                self.rect = RectTool::Committed;
                tracing::debug!("Rectangle committed: {:?}", rect);
                tracing::info!("Now press the key (n) a few times till required");
            }
            _ => {}
        }
    }

    fn handle_brush(&mut self, event: PointerEvent, state: &mut ImageState) {
        match (self.brush, event) {
            (
                BrushTool::Idle,
                PointerEvent::Press {
                    button: Button::Primary,
                    x,
                    y,
                },
            ) => {
                if !self.rect.has_committed() {
                    tracing::warn!("First, draw rectangle");
                    return;
                }
                self.brush = BrushTool::Drawing;
                state.stamp((x, y), self.thickness, self.draw_label);
            }
            (BrushTool::Drawing, PointerEvent::Move { x, y }) => {
                state.stamp((x, y), self.thickness, self.draw_label);
            }
            (
                BrushTool::Drawing,
                PointerEvent::Release {
                    button: Button::Primary,
                    x,
                    y,
                },
            ) => {
                state.stamp((x, y), self.thickness, self.draw_label);
                self.brush = BrushTool::Idle;
            }
            _ => {}
        }
    }
}

impl Default for AnnotationController {
    fn default() -> Self {
        Self::new(DEFAULT_THICKNESS)
    }
}

//! Rectangle drawing gesture
//!
//! `Idle -> Drawing -> Idle`. A gesture starts on a primary-button press
//! while the drawing modifier is held or drawing mode is on, follows the
//! pointer while drawing, and ends on release of the button or of the
//! modifier that started it. Ending yields exactly one rectangle.

use super::model::{CanvasPoint, RectAnnotation};

/// What allowed the gesture to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTrigger {
    /// The drawing modifier key was held on press
    Modifier,
    /// Drawing mode was toggled on
    DrawMode,
}

/// Pointer button reported with a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Page, scale and color the rectangle is recorded with
#[derive(Debug, Clone, PartialEq)]
pub struct GestureContext {
    pub page: usize,
    pub scale: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
enum GestureState {
    Idle,
    Drawing {
        anchor: CanvasPoint,
        current: CanvasPoint,
        trigger: DrawTrigger,
        context: GestureContext,
    },
}

#[derive(Debug, Clone)]
pub struct RectGesture {
    state: GestureState,
}

impl Default for RectGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl RectGesture {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, GestureState::Drawing { .. })
    }

    pub fn trigger(&self) -> Option<DrawTrigger> {
        match &self.state {
            GestureState::Drawing { trigger, .. } => Some(*trigger),
            GestureState::Idle => None,
        }
    }

    /// Try to start drawing; returns true if the gesture started.
    ///
    /// A press while already drawing is ignored.
    pub fn pointer_down(
        &mut self,
        pos: CanvasPoint,
        button: PointerButton,
        modifier_held: bool,
        draw_mode: bool,
        context: GestureContext,
    ) -> bool {
        if self.is_drawing() || button != PointerButton::Primary {
            return false;
        }

        let trigger = if modifier_held {
            DrawTrigger::Modifier
        } else if draw_mode {
            DrawTrigger::DrawMode
        } else {
            return false;
        };

        self.state = GestureState::Drawing {
            anchor: pos,
            current: pos,
            trigger,
            context,
        };
        true
    }

    /// Follow the pointer; returns true if the extent changed
    pub fn pointer_move(&mut self, pos: CanvasPoint) -> bool {
        match &mut self.state {
            GestureState::Drawing { current, .. } if *current != pos => {
                *current = pos;
                true
            }
            _ => false,
        }
    }

    /// Button released: finish the gesture
    pub fn pointer_up(&mut self) -> Option<RectAnnotation> {
        self.finish()
    }

    /// Modifier key released: finishes only a modifier-started gesture
    pub fn modifier_released(&mut self) -> Option<RectAnnotation> {
        match self.trigger() {
            Some(DrawTrigger::Modifier) => self.finish(),
            _ => None,
        }
    }

    /// Abandon the gesture without producing a rectangle
    pub fn cancel(&mut self) -> bool {
        let was_drawing = self.is_drawing();
        self.state = GestureState::Idle;
        was_drawing
    }

    /// The rectangle as it would be recorded right now
    pub fn in_progress(&self) -> Option<RectAnnotation> {
        match &self.state {
            GestureState::Drawing {
                anchor,
                current,
                context,
                ..
            } => Some(RectAnnotation::from_corners(
                context.page,
                *anchor,
                *current,
                context.color.clone(),
                context.scale,
            )),
            GestureState::Idle => None,
        }
    }

    fn finish(&mut self) -> Option<RectAnnotation> {
        let rect = self.in_progress();
        self.state = GestureState::Idle;
        rect
    }
}

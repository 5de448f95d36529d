//! Toolbar and pager controls: buttons, numeric fields and their hit areas

use ratatui::layout::Rect;

/// Clickable controls of the viewer chrome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ZoomOut,
    ZoomField,
    ZoomIn,
    Print,
    Download,
    Thumbnails,
    DrawMode,
    Previous,
    PageField,
    Next,
}

/// One control placed on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedControl {
    pub control: Control,
    pub rect: Rect,
    pub label: String,
    pub enabled: bool,
}

/// Lay out labelled controls left to right with a one-cell gap.
///
/// Controls that do not fit are dropped.
pub fn lay_out_row(area: Rect, items: Vec<(Control, String, bool)>) -> Vec<PlacedControl> {
    let mut placed = Vec::with_capacity(items.len());
    let mut x = area.x;

    for (control, label, enabled) in items {
        let width = label.chars().count() as u16;
        if x.saturating_add(width) > area.right() {
            break;
        }
        placed.push(PlacedControl {
            control,
            rect: Rect::new(x, area.y, width, 1),
            label,
            enabled,
        });
        x = x.saturating_add(width + 1);
    }
    placed
}

/// Hit areas of the controls drawn in the last frame
#[derive(Debug, Default, Clone)]
pub struct ControlHitMap {
    placed: Vec<PlacedControl>,
}

impl ControlHitMap {
    pub fn clear(&mut self) {
        self.placed.clear();
    }

    pub fn extend(&mut self, placed: &[PlacedControl]) {
        self.placed.extend_from_slice(placed);
    }

    /// Enabled control under a cell
    pub fn hit(&self, column: u16, row: u16) -> Option<Control> {
        self.placed
            .iter()
            .find(|p| {
                column >= p.rect.x
                    && column < p.rect.right()
                    && row >= p.rect.y
                    && row < p.rect.bottom()
            })
            .filter(|p| p.enabled)
            .map(|p| p.control)
    }

    pub fn rect_of(&self, control: Control) -> Option<Rect> {
        self.placed
            .iter()
            .find(|p| p.control == control)
            .map(|p| p.rect)
    }
}

/// Digit-only input used for the page number and zoom percent
#[derive(Debug, Default, Clone)]
pub struct NumberField {
    editing: Option<String>,
}

impl NumberField {
    const MAX_DIGITS: usize = 6;

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn start(&mut self) {
        self.editing = Some(String::new());
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }

    pub fn buffer(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Returns false for non-digits or when the field is full
    pub fn push(&mut self, c: char) -> bool {
        match &mut self.editing {
            Some(buffer) if c.is_ascii_digit() && buffer.len() < Self::MAX_DIGITS => {
                buffer.push(c);
                true
            }
            _ => false,
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = &mut self.editing {
            buffer.pop();
        }
    }

    /// Stop editing; `None` if nothing was typed
    pub fn commit(&mut self) -> Option<usize> {
        self.editing.take()?.parse().ok()
    }

    /// What to show: the edit buffer, or `current` when not editing
    pub fn display(&self, current: impl std::fmt::Display) -> String {
        match &self.editing {
            Some(buffer) => format!("{buffer}_"),
            None => current.to_string(),
        }
    }
}

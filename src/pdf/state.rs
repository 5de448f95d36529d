//! View state: current page, zoom and thumbnail visibility

use super::zoom::{ScrollDirection, Zoom, ZoomLimits};

/// Navigation state for one open document
#[derive(Clone, Debug)]
pub struct ViewState {
    /// Current page (1-based)
    pub current_page: usize,

    /// Total page count, unknown until the document has loaded
    pub page_count: Option<usize>,

    pub zoom: Zoom,

    pub thumbnails_visible: bool,
}

impl ViewState {
    #[must_use]
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            current_page: 1,
            page_count: None,
            zoom: Zoom::new(limits),
            thumbnails_visible: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.page_count.is_some()
    }

    pub fn can_go_back(&self) -> bool {
        self.is_loaded() && self.current_page > 1
    }

    pub fn can_go_forward(&self) -> bool {
        self.page_count.is_some_and(|count| self.current_page < count)
    }

    pub fn scale(&self) -> f32 {
        self.zoom.factor()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetPageCount(count) => {
                if count == 0 {
                    self.page_count = None;
                    return vec![];
                }
                self.page_count = Some(count);
                self.current_page = self.current_page.clamp(1, count);

                let mut effects = vec![Effect::RenderCurrentPage];
                if self.thumbnails_visible {
                    effects.push(Effect::RenderThumbnails);
                }
                effects
            }

            Command::GoToPage(page) => self.go_to(page),
            Command::NextPage => self.go_to(self.current_page.saturating_add(1)),
            Command::PrevPage => self.go_to(self.current_page.saturating_sub(1)),
            Command::FirstPage => self.go_to(1),
            Command::LastPage => self.go_to(self.page_count.unwrap_or(1)),

            Command::ZoomIn => {
                let changed = self.zoom.step_in();
                self.zoom_effects(changed)
            }
            Command::ZoomOut => {
                let changed = self.zoom.step_out();
                self.zoom_effects(changed)
            }
            Command::SetScale(scale) => {
                let changed = self.zoom.set(scale);
                self.zoom_effects(changed)
            }
            Command::ResetZoom => {
                let changed = self.zoom.reset();
                self.zoom_effects(changed)
            }

            Command::ToggleThumbnails => {
                self.thumbnails_visible = !self.thumbnails_visible;
                if self.thumbnails_visible && self.is_loaded() {
                    vec![Effect::RenderThumbnails]
                } else {
                    vec![]
                }
            }

            Command::Pan(direction) => {
                self.zoom.pan(direction);
                vec![]
            }

            Command::AnnotationsChanged => vec![Effect::RecompositeOverlay],
        }
    }

    fn go_to(&mut self, page: usize) -> Vec<Effect> {
        let Some(count) = self.page_count else {
            return vec![];
        };

        let clamped = page.clamp(1, count);
        if clamped == self.current_page {
            return vec![];
        }

        self.current_page = clamped;
        self.zoom.reset_pan();
        vec![Effect::CancelGesture, Effect::RenderCurrentPage]
    }

    fn zoom_effects(&mut self, changed: bool) -> Vec<Effect> {
        if !changed {
            return vec![];
        }
        self.zoom.reset_pan();
        if self.is_loaded() {
            vec![Effect::CancelGesture, Effect::RenderCurrentPage]
        } else {
            vec![Effect::CancelGesture]
        }
    }
}

/// Commands that modify view state
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// The document finished loading
    SetPageCount(usize),
    /// Go to a specific page (1-based), clamped
    GoToPage(usize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    ZoomIn,
    ZoomOut,
    /// Set an absolute scale factor, clamped
    SetScale(f32),
    ResetZoom,
    ToggleThumbnails,
    Pan(ScrollDirection),
    /// The annotation list for the document changed
    AnnotationsChanged,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Request the current page at the current scale
    RenderCurrentPage,
    /// Redraw annotations over the current page bitmap
    RecompositeOverlay,
    /// Request thumbnails for every page
    RenderThumbnails,
    /// Discard a drawing gesture that no longer matches the canvas
    CancelGesture,
}

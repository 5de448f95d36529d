//! Zoom and pan state for the page canvas
//!
//! Manages the zoom factor within configured bounds, and the pan offset
//! used when a zoomed page is larger than the terminal area.

/// Scroll/pan direction for zoom navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// Returns true if the direction is vertical (Up or Down)
    pub fn vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Bounds and step for the zoom factor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            step: 0.1,
            default: 1.0,
        }
    }
}

impl ZoomLimits {
    /// Clamp factor to the valid range; `None` for NaN/Inf.
    ///
    /// Inverted bounds never panic, the upper one wins.
    pub fn clamp(&self, factor: f32) -> Option<f32> {
        if !factor.is_finite() {
            return None;
        }
        Some(round_hundredths(factor).max(self.min).min(self.max))
    }
}

/// Zoom and pan state for PDF viewing
#[derive(Debug, Clone)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    factor: f32,

    limits: ZoomLimits,

    /// Horizontal pan offset in canvas dots from the left edge
    pub pan_x: u32,

    /// Vertical pan offset in canvas dots from the top edge
    pub pan_y: u32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

impl Zoom {
    /// Base pan step in dots for horizontal movement
    pub const BASE_PAN_STEP_X: u32 = 4;
    /// Base pan step in dots for vertical movement
    pub const BASE_PAN_STEP_Y: u32 = 4;

    pub fn new(limits: ZoomLimits) -> Self {
        let factor = limits.clamp(limits.default).unwrap_or(limits.min);
        Self {
            factor,
            limits,
            pan_x: 0,
            pan_y: 0,
        }
    }

    /// Returns the current zoom factor
    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    /// Zoom as a whole percentage, as shown in the zoom field
    pub fn percent(&self) -> u32 {
        (self.factor * 100.0).round() as u32
    }

    /// Zoom in by one step; returns true if the factor changed
    pub fn step_in(&mut self) -> bool {
        self.set(self.factor + self.limits.step)
    }

    /// Zoom out by one step; returns true if the factor changed
    pub fn step_out(&mut self) -> bool {
        self.set(self.factor - self.limits.step)
    }

    /// Set an absolute factor, clamped; returns true if the factor changed
    pub fn set(&mut self, factor: f32) -> bool {
        let Some(clamped) = self.limits.clamp(factor) else {
            return false;
        };
        if (clamped - self.factor).abs() > f32::EPSILON {
            self.factor = clamped;
            true
        } else {
            false
        }
    }

    /// Back to the configured default factor
    pub fn reset(&mut self) -> bool {
        self.set(self.limits.default)
    }

    /// Pan in the given direction
    pub fn pan(&mut self, direction: ScrollDirection) {
        match direction {
            ScrollDirection::Up => self.pan_y = self.pan_y.saturating_sub(Self::BASE_PAN_STEP_Y),
            ScrollDirection::Down => self.pan_y = self.pan_y.saturating_add(Self::BASE_PAN_STEP_Y),
            ScrollDirection::Left => self.pan_x = self.pan_x.saturating_sub(Self::BASE_PAN_STEP_X),
            ScrollDirection::Right => {
                self.pan_x = self.pan_x.saturating_add(Self::BASE_PAN_STEP_X);
            }
        }
    }

    /// Keep the pan offset inside the content that overflows the view
    pub fn clamp_pan(&mut self, max_x: u32, max_y: u32) {
        self.pan_x = self.pan_x.min(max_x);
        self.pan_y = self.pan_y.min(max_y);
    }

    pub fn reset_pan(&mut self) {
        self.pan_x = 0;
        self.pan_y = 0;
    }
}

fn round_hundredths(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

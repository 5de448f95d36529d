//! Half-block canvas: maps a page surface onto terminal cells.
//!
//! Each cell shows two vertically stacked dots using the upper half block,
//! foreground for the top dot and background for the bottom one. A page at
//! zoom 1.0 fits the canvas area; zooming changes how many dots it covers.

use image::{Rgb, RgbImage};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::annotations::CanvasPoint;

const UPPER_HALF_BLOCK: &str = "\u{2580}";

/// Placement of a surface inside a canvas area, in dots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    pub area: Rect,
    /// Surface pixels per dot
    pub pixels_per_dot: f32,
    /// Page size in dots
    pub content_width: u32,
    pub content_height: u32,
    /// Where the page starts inside the area when it is smaller than it
    pub offset_x: u32,
    pub offset_y: u32,
    pub pan_x: u32,
    pub pan_y: u32,
}

impl CanvasLayout {
    /// Layout for a `surface_width` x `surface_height` surface rendered at
    /// `scale`. The pan offset is clamped to the overflow.
    pub fn new(
        area: Rect,
        surface_width: u32,
        surface_height: u32,
        scale: f32,
        pan_x: u32,
        pan_y: u32,
    ) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let view_width = u32::from(area.width).max(1);
        let view_height = u32::from(area.height).max(1) * 2;

        let unit_width = surface_width as f32 / scale;
        let unit_height = surface_height as f32 / scale;
        let pixels_per_dot = (unit_width / view_width as f32)
            .max(unit_height / view_height as f32)
            .max(f32::EPSILON);

        let content_width = ((surface_width as f32 / pixels_per_dot).round() as u32).max(1);
        let content_height = ((surface_height as f32 / pixels_per_dot).round() as u32).max(1);

        let mut layout = Self {
            area,
            pixels_per_dot,
            content_width,
            content_height,
            offset_x: view_width.saturating_sub(content_width) / 2,
            offset_y: view_height.saturating_sub(content_height) / 2,
            pan_x: 0,
            pan_y: 0,
        };
        layout.pan_x = pan_x.min(layout.max_pan_x());
        layout.pan_y = pan_y.min(layout.max_pan_y());
        layout
    }

    fn view_width(&self) -> u32 {
        u32::from(self.area.width)
    }

    fn view_height(&self) -> u32 {
        u32::from(self.area.height) * 2
    }

    pub fn max_pan_x(&self) -> u32 {
        self.content_width.saturating_sub(self.view_width())
    }

    pub fn max_pan_y(&self) -> u32 {
        self.content_height.saturating_sub(self.view_height())
    }

    /// Content dot shown at a view dot, if the page covers it
    fn content_dot(&self, view_x: u32, view_y: u32) -> Option<(u32, u32)> {
        let x = (view_x + self.pan_x).checked_sub(self.offset_x)?;
        let y = (view_y + self.pan_y).checked_sub(self.offset_y)?;
        (x < self.content_width && y < self.content_height).then_some((x, y))
    }

    /// Surface point under a terminal cell (its top dot), if the cell is on
    /// the page
    pub fn cell_to_surface(&self, column: u16, row: u16) -> Option<CanvasPoint> {
        if !self.contains(column, row) {
            return None;
        }
        let view_x = u32::from(column - self.area.x);
        let view_y = u32::from(row - self.area.y) * 2;
        let (x, y) = self.content_dot(view_x, view_y)?;
        Some(CanvasPoint::new(
            x as f32 * self.pixels_per_dot,
            y as f32 * self.pixels_per_dot,
        ))
    }

    /// Like [`Self::cell_to_surface`] but pinned to the page edges, for drags
    /// that leave the page
    pub fn cell_to_surface_clamped(&self, column: u16, row: u16) -> CanvasPoint {
        let view_x = i64::from(column) - i64::from(self.area.x);
        let view_y = (i64::from(row) - i64::from(self.area.y)) * 2;
        let x = (view_x + i64::from(self.pan_x) - i64::from(self.offset_x))
            .clamp(0, i64::from(self.content_width));
        let y = (view_y + i64::from(self.pan_y) - i64::from(self.offset_y))
            .clamp(0, i64::from(self.content_height));
        CanvasPoint::new(
            x as f32 * self.pixels_per_dot,
            y as f32 * self.pixels_per_dot,
        )
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.right()
            && row >= self.area.y
            && row < self.area.bottom()
    }
}

/// A surface resampled to dot resolution, reused across frames
pub struct DotImage {
    generation: u64,
    image: RgbImage,
}

impl DotImage {
    pub fn matches(&self, generation: u64, layout: &CanvasLayout) -> bool {
        self.generation == generation
            && self.image.width() == layout.content_width
            && self.image.height() == layout.content_height
    }

    pub fn new(generation: u64, image: RgbImage) -> Self {
        Self { generation, image }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// Paints a dot image into the canvas area
pub struct HalfBlockCanvas<'a> {
    pub image: &'a RgbImage,
    pub layout: &'a CanvasLayout,
    pub background: Color,
}

impl Widget for HalfBlockCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        let pixel = |x: u32, y: u32| -> Option<Color> {
            let (cx, cy) = self.layout.content_dot(x, y)?;
            let Rgb([r, g, b]) = *self.image.get_pixel_checked(cx, cy)?;
            Some(Color::Rgb(r, g, b))
        };

        for row in 0..area.height {
            for col in 0..area.width {
                let view_x = u32::from(col);
                let view_y = u32::from(row) * 2;
                let top = pixel(view_x, view_y);
                let bottom = pixel(view_x, view_y + 1);

                let cell = &mut buf[(area.x + col, area.y + row)];
                match (top, bottom) {
                    (None, None) => {
                        cell.set_symbol(" ").set_bg(self.background);
                    }
                    (top, bottom) => {
                        cell.set_symbol(UPPER_HALF_BLOCK)
                            .set_fg(top.unwrap_or(self.background))
                            .set_bg(bottom.unwrap_or(self.background));
                    }
                }
            }
        }
    }
}

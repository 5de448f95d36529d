//! Drawing surface that pages and annotations are painted onto

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::ViewerError;

/// Pixel dimensions of a page at a given zoom scale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport for a page of `page_width` x `page_height` points at `scale`.
    ///
    /// Rounded up to whole pixels, never smaller than 1x1.
    pub fn from_page_size(page_width: f32, page_height: f32, scale: f32) -> Self {
        let px = |v: f32| ((v * scale).ceil().max(1.0)) as u32;
        Self {
            width: px(page_width),
            height: px(page_height),
        }
    }
}

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// RGB pixel buffer
#[derive(Clone)]
pub struct Surface {
    image: RgbImage,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    /// Resize to the viewport, clearing to white
    pub fn resize_to(&mut self, viewport: Viewport) {
        self.image = RgbImage::from_pixel(viewport.width.max(1), viewport.height.max(1), WHITE);
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    pub fn fill(&mut self, color: Rgb<u8>) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }

    /// Replace contents with a copy of `other`, adopting its size
    pub fn copy_from(&mut self, other: &Surface) {
        self.image.clone_from(&other.image);
    }

    /// Stroke the outline of a rectangle, clipped to the surface.
    ///
    /// Negative extents are accepted and mirrored around the origin.
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb<u8>, thickness: u32) {
        let (x0, x1) = ordered(x, x + w);
        let (y0, y1) = ordered(y, y + h);
        let t = thickness.max(1) as f32;

        // top, bottom, left, right bands
        self.fill_rect(x0, y0, x1 + 1.0, y0 + t, color);
        self.fill_rect(x0, y1 + 1.0 - t, x1 + 1.0, y1 + 1.0, color);
        self.fill_rect(x0, y0, x0 + t, y1 + 1.0, color);
        self.fill_rect(x1 + 1.0 - t, y0, x1 + 1.0, y1 + 1.0, color);
    }

    fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb<u8>) {
        let clamp_x = |v: f32| v.floor().clamp(0.0, self.width() as f32) as u32;
        let clamp_y = |v: f32| v.floor().clamp(0.0, self.height() as f32) as u32;
        let (sx, ex) = (clamp_x(x0), clamp_x(x1));
        let (sy, ey) = (clamp_y(y0), clamp_y(y1));

        for py in sy..ey {
            for px in sx..ex {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    /// Resampled copy at the given size, for terminal display and thumbnails
    pub fn downscale(&self, width: u32, height: u32) -> RgbImage {
        let (w, h) = (width.max(1), height.max(1));
        if w == self.width() && h == self.height() {
            return self.image.clone();
        }
        imageops::resize(&self.image, w, h, FilterType::Triangle)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), ViewerError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| ViewerError::print(format!("cannot write snapshot {path:?}: {e}")))
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn viewport_scales_page_points() {
        let vp = Viewport::from_page_size(612.0, 792.0, 0.5);
        assert_eq!(vp, Viewport { width: 306, height: 396 });

        let tiny = Viewport::from_page_size(10.0, 10.0, 0.0);
        assert_eq!(tiny, Viewport { width: 1, height: 1 });
    }

    #[test]
    fn resize_clears_to_white() {
        let mut surface = Surface::new(4, 4);
        surface.fill(RED);
        surface.resize_to(Viewport { width: 8, height: 2 });

        assert_eq!(surface.width(), 8);
        assert_eq!(surface.height(), 2);
        assert_eq!(surface.pixel(7, 1), Some(WHITE));
    }

    #[test]
    fn stroke_rect_paints_outline_only() {
        let mut surface = Surface::new(20, 20);
        surface.stroke_rect(2.0, 2.0, 10.0, 6.0, RED, 1);

        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert_eq!(surface.pixel(12, 8), Some(RED));
        assert_eq!(surface.pixel(7, 2), Some(RED));
        assert_eq!(surface.pixel(2, 5), Some(RED));
        assert_eq!(surface.pixel(7, 5), Some(WHITE));
        assert_eq!(surface.pixel(13, 5), Some(WHITE));
    }

    #[test]
    fn stroke_rect_accepts_negative_extent_and_clips() {
        let mut surface = Surface::new(10, 10);
        surface.stroke_rect(8.0, 8.0, -4.0, -4.0, RED, 1);
        assert_eq!(surface.pixel(4, 4), Some(RED));
        assert_eq!(surface.pixel(8, 8), Some(RED));

        // partially off-surface must not panic
        surface.stroke_rect(-5.0, -5.0, 10.0, 10.0, RED, 2);
        assert_eq!(surface.pixel(5, 0), Some(RED));
        assert_eq!(surface.pixel(0, 0), Some(WHITE));
    }

    #[test]
    fn downscale_keeps_requested_size() {
        let surface = Surface::new(100, 50);
        let small = surface.downscale(10, 5);
        assert_eq!(small.dimensions(), (10, 5));
    }
}

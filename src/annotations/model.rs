use chrono::{DateTime, Utc};
use image::Rgb;
use serde::{Deserialize, Serialize};

/// A point on the drawing surface, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle drawn over a page.
///
/// Geometry is in drawing-surface pixels at `scale`, the zoom that was
/// active when the rectangle was drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectAnnotation {
    /// Page number (1-based)
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// `#rrggbb`
    pub color: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_scale() -> f32 {
    1.0
}

impl RectAnnotation {
    /// Rectangle spanning `anchor` to `current`, normalised so that width
    /// and height are non-negative.
    pub fn from_corners(
        page: usize,
        anchor: CanvasPoint,
        current: CanvasPoint,
        color: impl Into<String>,
        scale: f32,
    ) -> Self {
        Self {
            page,
            x: anchor.x,
            y: anchor.y,
            width: current.x - anchor.x,
            height: current.y - anchor.y,
            color: color.into(),
            scale,
            created_at: Utc::now(),
        }
        .normalized()
    }

    /// Move the origin so that width and height are non-negative
    pub fn normalized(mut self) -> Self {
        if self.width < 0.0 {
            self.x += self.width;
            self.width = -self.width;
        }
        if self.height < 0.0 {
            self.y += self.height;
            self.height = -self.height;
        }
        self
    }

    /// Geometry `(x, y, width, height)` in pixels at another zoom scale
    pub fn scaled_to(&self, scale: f32) -> (f32, f32, f32, f32) {
        let factor = if self.scale > 0.0 && self.scale.is_finite() {
            scale / self.scale
        } else {
            1.0
        };
        (
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    pub fn rgb(&self) -> Rgb<u8> {
        parse_color(&self.color).unwrap_or(Rgb([255, 0, 0]))
    }
}

/// Parse `#rrggbb`, `#rgb` or a basic color name
pub fn parse_color(value: &str) -> Option<Rgb<u8>> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    let rgb = match value.to_ascii_lowercase().as_str() {
        "red" => [255, 0, 0],
        "green" => [0, 160, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 215, 0],
        "orange" => [255, 140, 0],
        "magenta" => [255, 0, 255],
        "cyan" => [0, 200, 200],
        "black" => [0, 0, 0],
        _ => return None,
    };
    Some(Rgb(rgb))
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Rgb([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ])),
        3 => {
            let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(Rgb([short(0)?, short(1)?, short(2)?]))
        }
        _ => None,
    }
}

/// Format a color as `#rrggbb`
pub fn format_color(color: Rgb<u8>) -> String {
    let Rgb([r, g, b]) = color;
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Colors cycled through by the color key
pub const PALETTE: [&str; 5] = ["#ff0000", "#0066ff", "#00a000", "#ff8c00", "#cc00cc"];

/// The palette entry after `current`, starting over at the first
pub fn next_palette_color(current: &str) -> &'static str {
    let position = PALETTE
        .iter()
        .position(|c| c.eq_ignore_ascii_case(current));
    match position {
        Some(i) => PALETTE[(i + 1) % PALETTE.len()],
        None => PALETTE[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalised() {
        let rect = RectAnnotation::from_corners(
            1,
            CanvasPoint::new(50.0, 40.0),
            CanvasPoint::new(10.0, 10.0),
            "#ff0000",
            1.0,
        );
        assert_eq!(
            (rect.x, rect.y, rect.width, rect.height),
            (10.0, 10.0, 40.0, 30.0)
        );
    }

    #[test]
    fn geometry_follows_zoom() {
        let rect = RectAnnotation::from_corners(
            1,
            CanvasPoint::new(10.0, 20.0),
            CanvasPoint::new(30.0, 60.0),
            "#ff0000",
            0.5,
        );
        assert_eq!(rect.scaled_to(1.0), (20.0, 40.0, 40.0, 80.0));
        assert_eq!(rect.scaled_to(0.5), (10.0, 20.0, 20.0, 40.0));
    }

    #[test]
    fn colors_parse() {
        assert_eq!(parse_color("#ff8000"), Some(Rgb([255, 128, 0])));
        assert_eq!(parse_color("#f80"), Some(Rgb([255, 136, 0])));
        assert_eq!(parse_color("Red"), Some(Rgb([255, 0, 0])));
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("chartreuse"), None);
        assert_eq!(format_color(Rgb([0, 102, 255])), "#0066ff");
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(next_palette_color("#ff0000"), "#0066ff");
        assert_eq!(next_palette_color("#CC00CC"), "#ff0000");
        assert_eq!(next_palette_color("purple"), "#ff0000");
    }

    #[test]
    fn records_without_scale_default_to_unit_scale() {
        let json = r##"{"page":2,"x":1.0,"y":2.0,"width":3.0,"height":4.0,"color":"#00ff00"}"##;
        let rect: RectAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(rect.scale, 1.0);
        assert_eq!(rect.page, 2);
    }
}

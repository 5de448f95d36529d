//! Painting annotation outlines over a rendered page

use image::Rgb;

use crate::pdf::Surface;

use super::model::RectAnnotation;

/// Outline thickness in surface pixels
pub const STROKE_WIDTH: u32 = 2;

/// Paint every annotation of `page` onto `surface`, which holds the page
/// rendered at `scale`. Rectangles drawn at another zoom are rescaled.
///
/// Returns how many rectangles were painted.
pub fn paint_annotations<'a>(
    surface: &mut Surface,
    annotations: impl IntoIterator<Item = &'a RectAnnotation>,
    page: usize,
    scale: f32,
) -> usize {
    let mut painted = 0;
    for annotation in annotations.into_iter().filter(|a| a.page == page) {
        paint_one(surface, annotation, scale, annotation.rgb());
        painted += 1;
    }
    painted
}

/// Paint the rectangle of a gesture still in progress
pub fn paint_preview(surface: &mut Surface, preview: &RectAnnotation, scale: f32) {
    paint_one(surface, preview, scale, preview.rgb());
}

fn paint_one(surface: &mut Surface, annotation: &RectAnnotation, scale: f32, color: Rgb<u8>) {
    let (x, y, w, h) = annotation.scaled_to(scale);
    surface.stroke_rect(x, y, w, h, color, STROKE_WIDTH);
}

#[cfg(test)]
mod tests {
    use super::super::model::CanvasPoint;
    use super::*;
    use crate::pdf::WHITE;

    fn rect(page: usize, from: (f32, f32), to: (f32, f32), scale: f32) -> RectAnnotation {
        RectAnnotation::from_corners(
            page,
            CanvasPoint::new(from.0, from.1),
            CanvasPoint::new(to.0, to.1),
            "#0000ff",
            scale,
        )
    }

    #[test]
    fn only_current_page_is_painted() {
        let mut surface = Surface::new(100, 100);
        let list = vec![
            rect(1, (10.0, 10.0), (50.0, 40.0), 1.0),
            rect(2, (60.0, 60.0), (90.0, 90.0), 1.0),
        ];

        assert_eq!(paint_annotations(&mut surface, &list, 1, 1.0), 1);
        assert_eq!(surface.pixel(10, 10), Some(Rgb([0, 0, 255])));
        assert_eq!(surface.pixel(60, 60), Some(WHITE));
    }

    #[test]
    fn rectangles_follow_zoom() {
        let mut surface = Surface::new(100, 100);
        let list = vec![rect(1, (10.0, 10.0), (20.0, 20.0), 0.5)];

        paint_annotations(&mut surface, &list, 1, 1.0);
        assert_eq!(surface.pixel(20, 20), Some(Rgb([0, 0, 255])));
        assert_eq!(surface.pixel(10, 10), Some(WHITE));
    }

    #[test]
    fn preview_is_painted() {
        let mut surface = Surface::new(30, 30);
        paint_preview(&mut surface, &rect(1, (5.0, 5.0), (15.0, 15.0), 1.0), 1.0);
        assert_eq!(surface.pixel(5, 5), Some(Rgb([0, 0, 255])));
        assert_eq!(surface.pixel(10, 10), Some(WHITE));
    }
}

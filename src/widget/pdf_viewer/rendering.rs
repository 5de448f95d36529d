//! Drawing the viewer: toolbar, thumbnail strip, canvas, pager and HUD line

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use super::PdfViewer;
use super::canvas::{CanvasLayout, DotImage, HalfBlockCanvas};
use super::controls::{Control, PlacedControl, lay_out_row};
use super::thumbnails::STRIP_WIDTH;

const HELP_HINT: &str =
    "n/p page  +/- zoom  g goto  t thumbnails  a draw  c color  P print  d download  q quit";

impl PdfViewer {
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.render_to_buffer(area, frame.buffer_mut());
    }

    pub(crate) fn render_to_buffer(&mut self, area: Rect, buf: &mut Buffer) {
        let [toolbar, body, pager, hud] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        self.hit_map.clear();
        self.render_toolbar(toolbar, buf);
        self.render_body(body, buf);
        self.render_pager(pager, buf);
        self.render_hud(hud, buf);
    }

    fn render_toolbar(&mut self, area: Rect, buf: &mut Buffer) {
        let loaded = self.state.is_loaded();
        let zoom = self.state.zoom.percent();
        let zoom_label = format!("[ {}% ]", self.zoom_field.display(zoom));
        let draw_label = if self.draw_mode {
            "[Draw: on]"
        } else {
            "[Draw: off]"
        };

        let placed = lay_out_row(
            area,
            vec![
                (Control::ZoomOut, "[Zoom Out]".to_string(), loaded),
                (Control::ZoomField, zoom_label, loaded),
                (Control::ZoomIn, "[Zoom In]".to_string(), loaded),
                (Control::Print, "[Print]".to_string(), loaded),
                (Control::Download, "[Download]".to_string(), loaded),
                (Control::Thumbnails, "[Thumbnails]".to_string(), loaded),
                (Control::DrawMode, draw_label.to_string(), loaded),
            ],
        );
        self.draw_controls(&placed, buf);
    }

    fn render_pager(&mut self, area: Rect, buf: &mut Buffer) {
        let current = self.state.current_page;
        let total = self
            .state
            .page_count
            .map_or_else(|| "?".to_string(), |count| count.to_string());
        let page_label = format!("[ {} ]", self.page_field.display(current));

        let placed = lay_out_row(
            area,
            vec![
                (
                    Control::Previous,
                    "[Previous]".to_string(),
                    self.state.can_go_back(),
                ),
                (Control::PageField, page_label, self.state.is_loaded()),
            ],
        );
        self.draw_controls(&placed, buf);
        let Some(field) = placed.last().filter(|p| p.control == Control::PageField) else {
            return;
        };

        // page counter between the field and [Next]
        let counter = format!("/ {total}");
        let x = field.rect.right() + 1;
        let width = (counter.chars().count() as u16).min(area.right().saturating_sub(x));
        Line::styled(counter, Style::default().fg(self.palette.base_05))
            .render(Rect::new(x, area.y, width, 1), buf);

        let x = x + width + 1;
        if x < area.right() {
            let rest = Rect::new(x, area.y, area.right() - x, 1);
            let placed = lay_out_row(
                rest,
                vec![(
                    Control::Next,
                    "[Next]".to_string(),
                    self.state.can_go_forward(),
                )],
            );
            self.draw_controls(&placed, buf);
        }
    }

    fn draw_controls(&mut self, placed: &[PlacedControl], buf: &mut Buffer) {
        for item in placed {
            let style = match item.control {
                Control::ZoomField => self.palette.field_style(self.zoom_field.is_editing()),
                Control::PageField => self.palette.field_style(self.page_field.is_editing()),
                Control::Thumbnails => self
                    .palette
                    .button_style(item.enabled, self.state.thumbnails_visible),
                Control::DrawMode => self.palette.button_style(item.enabled, self.draw_mode),
                _ => self.palette.button_style(item.enabled, false),
            };
            Span::styled(item.label.as_str(), style).render(item.rect, buf);
        }
        self.hit_map.extend(placed);
    }

    fn render_body(&mut self, area: Rect, buf: &mut Buffer) {
        let canvas_area = if self.state.thumbnails_visible && area.width > STRIP_WIDTH * 2 {
            let [strip, rest] = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(STRIP_WIDTH), Constraint::Min(1)])
                .areas(area);
            self.thumbnail_area = Some(strip);
            let count = self.state.page_count.unwrap_or(0);
            self.thumbnails
                .render(strip, buf, self.state.current_page, count, self.palette);
            rest
        } else {
            self.thumbnail_area = None;
            self.thumbnails.hide();
            area
        };

        let (_, border, background) = self.palette.get_panel_colors(true);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(Line::from(format!(" {} ", self.title)))
            .style(Style::default().bg(background));
        let inner = block.inner(canvas_area);
        block.render(canvas_area, buf);

        self.render_canvas(inner, buf);
    }

    fn render_canvas(&mut self, area: Rect, buf: &mut Buffer) {
        if let Some(message) = &self.load_error {
            self.canvas_layout = None;
            Paragraph::new(vec![
                Line::from(""),
                Line::styled("Could not open document", Style::default().fg(self.palette.base_08))
                    .centered(),
                Line::styled(message.as_str(), Style::default().fg(self.palette.base_05))
                    .centered(),
            ])
            .render(area, buf);
            return;
        }

        let (Some(canvas), Some(bitmap)) = (&self.canvas, &self.page_bitmap) else {
            self.canvas_layout = None;
            let y = area.y + area.height / 2;
            Line::styled("[ LOADING ]", Style::default().fg(self.palette.base_03))
                .centered()
                .render(Rect::new(area.x, y, area.width, 1), buf);
            return;
        };

        let layout = CanvasLayout::new(
            area,
            canvas.width(),
            canvas.height(),
            bitmap.scale,
            self.state.zoom.pan_x,
            self.state.zoom.pan_y,
        );
        self.state
            .zoom
            .clamp_pan(layout.max_pan_x(), layout.max_pan_y());

        let stale = !self
            .dot_image
            .as_ref()
            .is_some_and(|dots| dots.matches(self.canvas_generation, &layout));
        if stale {
            let image = canvas.downscale(layout.content_width, layout.content_height);
            self.dot_image = Some(DotImage::new(self.canvas_generation, image));
        }

        if let Some(dots) = &self.dot_image {
            let (_, _, background) = self.palette.get_panel_colors(true);
            HalfBlockCanvas {
                image: dots.image(),
                layout: &layout,
                background,
            }
            .render(area, buf);
        }
        self.canvas_layout = Some(layout);
    }

    fn render_hud(&self, area: Rect, buf: &mut Buffer) {
        match &self.hud {
            Some(hud) => hud.styled_line(self.palette).render(area, buf),
            None => {
                let hint = if self.rendering {
                    format!("rendering...  {HELP_HINT}")
                } else {
                    HELP_HINT.to_string()
                };
                Line::styled(hint, Style::default().fg(self.palette.base_03))
                    .centered()
                    .render(area, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::annotations::MemoryStore;
    use crate::pdf::DocumentSource;
    use crate::settings::Settings;
    use crate::system_command::MockSystemCommandExecutor;
    use crate::test_utils::test_helpers::FakeBackend;
    use crate::widget::pdf_viewer::ViewerOptions;

    fn rendered(viewer: &mut PdfViewer, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        viewer.render_to_buffer(area, &mut buf);
        (0..height)
            .map(|y| (0..width).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    fn loaded_viewer(pages: usize) -> PdfViewer {
        let mut viewer = PdfViewer::new(
            DocumentSource::from_bytes("fake.pdf", b"%PDF-fake".to_vec()),
            Arc::new(FakeBackend::with_pages(pages)),
            Box::new(MemoryStore::new()),
            Settings::default(),
            Box::new(MockSystemCommandExecutor::new()),
            ViewerOptions::default(),
        );
        assert!(viewer.wait_until_idle(Duration::from_secs(5)));
        viewer
    }

    #[test]
    fn chrome_shows_zoom_and_page_counter() {
        let mut viewer = loaded_viewer(4);
        let lines = rendered(&mut viewer, 100, 30);

        assert!(lines[0].contains("[ 100% ]"));
        assert!(lines[0].contains("[Draw: off]"));
        assert!(lines[28].contains("[ 1 ]"));
        assert!(lines[28].contains("/ 4"));
        assert!(lines[28].contains("[Next]"));
    }

    #[test]
    fn previous_is_disabled_on_first_page() {
        let mut viewer = loaded_viewer(2);
        rendered(&mut viewer, 100, 30);

        let prev = viewer.hit_map.rect_of(Control::Previous).unwrap();
        assert_eq!(viewer.hit_map.hit(prev.x, prev.y), None);
        let next = viewer.hit_map.rect_of(Control::Next).unwrap();
        assert_eq!(viewer.hit_map.hit(next.x, next.y), Some(Control::Next));
    }

    #[test]
    fn canvas_is_drawn_with_half_blocks() {
        let mut viewer = loaded_viewer(1);
        let lines = rendered(&mut viewer, 82, 29);

        assert!(lines[10].contains('\u{2580}'));
        assert!(viewer.canvas_layout.is_some());
    }

    #[test]
    fn loading_placeholder_before_first_render() {
        let mut viewer = PdfViewer::new(
            DocumentSource::from_bytes("fake.pdf", b"%PDF-fake".to_vec()),
            Arc::new(FakeBackend::with_pages(1)),
            Box::new(MemoryStore::new()),
            Settings::default(),
            Box::new(MockSystemCommandExecutor::new()),
            ViewerOptions::default(),
        );
        let lines = rendered(&mut viewer, 60, 20);
        assert!(lines.iter().any(|l| l.contains("[ LOADING ]")));
    }
}

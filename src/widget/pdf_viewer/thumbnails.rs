//! Thumbnail strip: a scrolling column of small page previews

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbImage;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, BorderType, Borders, Widget},
};

use crate::pdf::PageBitmap;
use crate::theme::Base16Palette;

use super::canvas::{CanvasLayout, HalfBlockCanvas};

/// Columns taken by the strip, borders included
pub const STRIP_WIDTH: u16 = 16;
/// Rows per thumbnail cell, borders included
pub const CELL_HEIGHT: u16 = 9;

#[derive(Default)]
pub struct ThumbnailStrip {
    bitmaps: HashMap<usize, Arc<PageBitmap>>,
    /// Thumbnails resampled to their cell, reused until the cell size changes
    resized: HashMap<usize, RgbImage>,
    /// First page shown at the top of the strip
    first_visible: usize,
    /// Current page of the last frame; the strip follows it only when it moves
    last_current: Option<usize>,
    /// Cells drawn in the last frame
    hits: Vec<(Rect, usize)>,
}

impl ThumbnailStrip {
    pub fn insert(&mut self, bitmap: Arc<PageBitmap>) {
        self.resized.remove(&bitmap.page);
        self.bitmaps.insert(bitmap.page, bitmap);
    }

    pub fn has(&self, page: usize) -> bool {
        self.bitmaps.contains_key(&page)
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    pub fn first_visible(&self) -> usize {
        self.first_visible.max(1)
    }

    /// How many cells fit in `height` rows
    pub fn capacity(height: u16) -> usize {
        usize::from((height / CELL_HEIGHT).max(1))
    }

    /// Scroll so that `current` is on screen
    pub fn keep_visible(&mut self, current: usize, page_count: usize, height: u16) {
        let capacity = Self::capacity(height);
        let first = self.first_visible();
        if current < first {
            self.first_visible = current;
        } else if current >= first + capacity {
            self.first_visible = current + 1 - capacity;
        }
        let last_start = page_count.saturating_sub(capacity) + 1;
        self.first_visible = self.first_visible().min(last_start.max(1));
    }

    /// Scroll by whole cells, used by the mouse wheel over the strip
    pub fn scroll(&mut self, delta: isize, page_count: usize, height: u16) {
        let capacity = Self::capacity(height);
        let last_start = (page_count.saturating_sub(capacity) + 1).max(1);
        let next = self.first_visible() as isize + delta;
        self.first_visible = next.clamp(1, last_start as isize) as usize;
    }

    /// Page under a cell drawn in the last frame
    pub fn hit(&self, column: u16, row: u16) -> Option<usize> {
        self.hits
            .iter()
            .find(|(rect, _)| {
                column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
            })
            .map(|(_, page)| *page)
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.hits.iter().any(|(rect, _)| {
            column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
        })
    }

    /// Forget the cells of the last frame when the strip is not drawn
    pub fn hide(&mut self) {
        self.hits.clear();
    }

    pub fn render(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        current: usize,
        page_count: usize,
        palette: &Base16Palette,
    ) {
        self.hits.clear();
        if self.last_current != Some(current) {
            self.keep_visible(current, page_count, area.height);
            self.last_current = Some(current);
        } else {
            self.scroll(0, page_count, area.height);
        }

        let mut y = area.y;
        let mut page = self.first_visible();
        while page <= page_count && y + CELL_HEIGHT <= area.bottom() {
            let cell = Rect::new(area.x, y, area.width, CELL_HEIGHT);
            self.render_cell(cell, buf, page, page == current, palette);
            self.hits.push((cell, page));
            y += CELL_HEIGHT;
            page += 1;
        }
    }

    fn render_cell(
        &mut self,
        cell: Rect,
        buf: &mut Buffer,
        page: usize,
        is_current: bool,
        palette: &Base16Palette,
    ) {
        let (text, border, background) = palette.get_panel_colors(is_current);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if is_current {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(Style::default().fg(border))
            .title(Line::styled(format!(" {page} "), Style::default().fg(text)).centered())
            .style(Style::default().bg(background));
        let inner = block.inner(cell);
        block.render(cell, buf);

        let Some(bitmap) = self.bitmaps.get(&page) else {
            Line::styled("...", Style::default().fg(palette.base_03))
                .centered()
                .render(inner, buf);
            return;
        };

        let surface = &bitmap.surface;
        let layout = CanvasLayout::new(inner, surface.width(), surface.height(), 1.0, 0, 0);
        let stale = self.resized.get(&page).is_none_or(|image| {
            image.width() != layout.content_width || image.height() != layout.content_height
        });
        if stale {
            let image = surface.downscale(layout.content_width, layout.content_height);
            self.resized.insert(page, image);
        }
        let Some(image) = self.resized.get(&page) else {
            return;
        };
        HalfBlockCanvas {
            image,
            layout: &layout,
            background,
        }
        .render(inner, buf);
    }
}

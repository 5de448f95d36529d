//! Contract with the external PDF rendering library
//!
//! The viewer never parses PDF itself. A backend opens a document into a
//! handle that knows its page count, the viewport of a page at a scale, and
//! how to paint a page onto a [`Surface`].

use crate::error::ViewerError;

use super::source::DocumentSource;
use super::surface::{Surface, Viewport};

/// Factory for document handles.
///
/// Shared across render workers; each worker opens its own handle because
/// library documents are generally not `Send`.
pub trait PdfBackend: Send + Sync {
    fn open(&self, source: &DocumentSource) -> Result<Box<dyn DocumentHandle>, ViewerError>;
}

/// An opened document. Page indices are 0-based at this boundary.
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    fn title(&self) -> Option<String> {
        None
    }

    fn viewport(&self, index: usize, scale: f32) -> Result<Viewport, ViewerError>;

    /// Paint the page onto `surface`, which is already sized to the viewport
    fn render(&self, index: usize, scale: f32, surface: &mut Surface) -> Result<(), ViewerError>;
}

/// Size the surface to the page viewport and paint the page into it.
///
/// `page` is 1-based.
pub fn render_page_into(
    handle: &dyn DocumentHandle,
    page: usize,
    scale: f32,
    surface: &mut Surface,
) -> Result<Viewport, ViewerError> {
    let page_count = handle.page_count();
    if page == 0 || page > page_count {
        return Err(ViewerError::PageOutOfRange { page, page_count });
    }

    let index = page - 1;
    let viewport = handle.viewport(index, scale)?;
    surface.resize_to(viewport);
    handle.render(index, scale, surface)?;
    Ok(viewport)
}

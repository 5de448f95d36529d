//! mupdf implementation of the rendering backend

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use crate::error::ViewerError;

use super::backend::{DocumentHandle, PdfBackend};
use super::source::DocumentSource;
use super::surface::{Surface, Viewport};

const PDF_MAGIC: &str = "application/pdf";

#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl PdfBackend for MupdfBackend {
    fn open(&self, source: &DocumentSource) -> Result<Box<dyn DocumentHandle>, ViewerError> {
        let name = source.display_name();
        let doc = match source {
            DocumentSource::Path(path) => Document::open(path.to_string_lossy().as_ref()),
            DocumentSource::Bytes { data, .. } => Document::from_bytes(data, PDF_MAGIC),
        }
        .map_err(|e| ViewerError::load(&name, e))?;

        let page_count = doc.page_count().map_err(|e| ViewerError::load(&name, e))?;
        if page_count <= 0 {
            return Err(ViewerError::load(&name, "document has no pages"));
        }

        Ok(Box::new(MupdfDocument {
            doc,
            page_count: page_count as usize,
        }))
    }
}

struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn page_size(&self, index: usize) -> Result<(f32, f32), mupdf::error::Error> {
        let page = self.doc.load_page(index as i32)?;
        let bounds = page.bounds()?;
        Ok((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }
}

impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn title(&self) -> Option<String> {
        self.doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty())
    }

    fn viewport(&self, index: usize, scale: f32) -> Result<Viewport, ViewerError> {
        let (w, h) = self
            .page_size(index)
            .map_err(|e| ViewerError::render(index + 1, e))?;
        Ok(Viewport::from_page_size(w, h, scale))
    }

    fn render(&self, index: usize, scale: f32, surface: &mut Surface) -> Result<(), ViewerError> {
        let page = self
            .doc
            .load_page(index as i32)
            .map_err(|e| ViewerError::render(index + 1, e))?;

        let transform = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&transform, &rgb, false, false)
            .map_err(|e| ViewerError::render(index + 1, e))?;

        copy_pixmap(&pixmap, surface).map_err(|e| ViewerError::render(index + 1, e))
    }
}

/// Copy an RGB pixmap into the surface, cropping to the smaller of the two.
///
/// mupdf rounds the pixmap bounds itself, so it can differ from the viewport
/// by a pixel.
fn copy_pixmap(pixmap: &Pixmap, surface: &mut Surface) -> Result<(), String> {
    let n = pixmap.n() as usize;
    if n != 3 {
        return Err(format!("Unsupported pixmap format: {n} channels"));
    }

    let width = (pixmap.width() as usize).min(surface.width() as usize);
    let height = (pixmap.height() as usize).min(surface.height() as usize);
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;

    if samples.len() < stride * height || row_bytes > stride {
        return Err("Pixmap buffer smaller than expected".to_string());
    }

    let image = surface.image_mut();
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        for (x, px) in row.chunks_exact(3).enumerate() {
            image.put_pixel(x as u32, y as u32, image::Rgb([px[0], px[1], px[2]]));
        }
    }

    Ok(())
}

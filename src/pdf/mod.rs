//! PDF rendering infrastructure

mod backend;
mod cache;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod request;
mod service;
mod source;
mod state;
mod surface;
mod worker;
mod zoom;

pub use backend::{DocumentHandle, PdfBackend, render_page_into};
pub use cache::{CacheKey, PageCache};
#[cfg(feature = "pdf")]
pub use mupdf_backend::MupdfBackend;
pub use request::{PageBitmap, RenderKind, RenderRequest, RenderResponse, RequestId};
pub use service::{RenderConfig, RenderService};
pub use source::DocumentSource;
pub use state::{Command, Effect, ViewState};
pub use surface::{Surface, Viewport, WHITE};
pub use zoom::{ScrollDirection, Zoom, ZoomLimits};

/// Number of render worker threads
pub const DEFAULT_WORKERS: usize = 2;

/// Rendered bitmaps kept in memory (pages and thumbnails together)
pub const DEFAULT_CACHE_SIZE: usize = 64;

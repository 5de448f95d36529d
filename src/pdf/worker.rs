//! PDF render worker - runs in separate thread(s)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, warn};

use crate::error::ViewerError;

use super::backend::{DocumentHandle, PdfBackend, render_page_into};
use super::cache::{CacheKey, PageCache};
use super::request::{PageBitmap, RenderKind, RenderRequest, RenderResponse, RequestId};
use super::source::DocumentSource;
use super::surface::Surface;

/// Everything a worker thread needs, moved into the thread on spawn
pub struct WorkerContext {
    pub backend: Arc<dyn PdfBackend>,
    pub source: DocumentSource,
    pub requests: Receiver<RenderRequest>,
    pub responses: Sender<RenderResponse>,
    pub cache: Arc<Mutex<PageCache>>,
    /// Id of the most recent page request; older page requests are stale
    pub latest_page: Arc<AtomicU64>,
}

enum Opened {
    Ready(Box<dyn DocumentHandle>),
    Failed { name: String, reason: String },
}

/// Main worker function - runs in a dedicated thread
pub fn render_worker(ctx: WorkerContext) {
    let opened = match ctx.backend.open(&ctx.source) {
        Ok(handle) => Opened::Ready(handle),
        Err(e) => {
            warn!("Worker could not open {}: {e}", ctx.source.display_name());
            let reason = match e {
                ViewerError::DocumentLoadFailed { reason, .. } => reason,
                other => other.to_string(),
            };
            Opened::Failed {
                name: ctx.source.display_name(),
                reason,
            }
        }
    };

    for request in ctx.requests.iter() {
        match request {
            RenderRequest::LoadDocument { id } => {
                let response = match &opened {
                    Opened::Ready(handle) => RenderResponse::DocumentInfo {
                        id,
                        page_count: handle.page_count(),
                        title: handle.title(),
                    },
                    Opened::Failed { name, reason } => RenderResponse::Error {
                        id,
                        error: ViewerError::load(name, reason),
                    },
                };
                let _ = ctx.responses.send(response);
            }

            RenderRequest::Page { id, page, scale } => {
                if id.0 < ctx.latest_page.load(Ordering::Acquire) {
                    debug!("Skipping superseded render of page {page} ({id:?})");
                    let _ = ctx.responses.send(RenderResponse::Cancelled(id));
                    continue;
                }
                handle_render(&ctx, &opened, id, page, scale, RenderKind::Page);
            }

            RenderRequest::Thumbnail { id, page, scale } => {
                handle_render(&ctx, &opened, id, page, scale, RenderKind::Thumbnail);
            }

            RenderRequest::Shutdown => break,
        }
    }
}

fn handle_render(
    ctx: &WorkerContext,
    opened: &Opened,
    id: RequestId,
    page: usize,
    scale: f32,
    kind: RenderKind,
) {
    let handle = match opened {
        Opened::Ready(handle) => handle.as_ref(),
        Opened::Failed { name, reason } => {
            let error = ViewerError::load(name, reason);
            let _ = ctx.responses.send(RenderResponse::Error { id, error });
            return;
        }
    };

    let key = CacheKey::new(page, scale, kind);
    let cached = ctx
        .cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key);
    if let Some(bitmap) = cached {
        let _ = ctx.responses.send(RenderResponse::Page { id, page, bitmap });
        return;
    }

    match render_bitmap(handle, page, scale, kind) {
        Ok(bitmap) => {
            let bitmap = ctx
                .cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key, bitmap);
            let _ = ctx.responses.send(RenderResponse::Page { id, page, bitmap });
        }
        Err(error) => {
            let _ = ctx.responses.send(RenderResponse::Error { id, error });
        }
    }
}

/// Render a single page at `scale` into a fresh surface
pub fn render_bitmap(
    handle: &dyn DocumentHandle,
    page: usize,
    scale: f32,
    kind: RenderKind,
) -> Result<PageBitmap, ViewerError> {
    let mut surface = Surface::default();
    let viewport = render_page_into(handle, page, scale, &mut surface)?;

    Ok(PageBitmap {
        page,
        scale,
        kind,
        viewport,
        surface,
    })
}

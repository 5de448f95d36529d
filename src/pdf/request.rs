//! Render request and response types

use std::sync::Arc;

use crate::error::ViewerError;

use super::surface::{Surface, Viewport};

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// What a rendered bitmap is for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderKind {
    /// The main canvas
    Page,
    /// A thumbnail strip entry
    Thumbnail,
}

/// A page painted at a given scale
#[derive(Clone)]
pub struct PageBitmap {
    /// Page number (1-based)
    pub page: usize,
    pub scale: f32,
    pub kind: RenderKind,
    pub viewport: Viewport,
    pub surface: Surface,
}

impl std::fmt::Debug for PageBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBitmap")
            .field("page", &self.page)
            .field("scale", &self.scale)
            .field("kind", &self.kind)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

/// Request sent to render workers
#[derive(Debug)]
pub enum RenderRequest {
    /// Resolve page count and metadata
    LoadDocument { id: RequestId },

    /// Render a page for the main canvas; superseded by any later page request
    Page {
        id: RequestId,
        page: usize,
        scale: f32,
    },

    /// Render a thumbnail (never superseded)
    Thumbnail {
        id: RequestId,
        page: usize,
        scale: f32,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Response from render workers
#[derive(Debug)]
pub enum RenderResponse {
    /// Document metadata
    DocumentInfo {
        id: RequestId,
        page_count: usize,
        title: Option<String>,
    },

    /// Rendered page or thumbnail
    Page {
        id: RequestId,
        page: usize,
        bitmap: Arc<PageBitmap>,
    },

    /// Request was superseded before it was rendered
    Cancelled(RequestId),

    /// Error while loading or rendering
    Error { id: RequestId, error: ViewerError },
}

impl RenderResponse {
    pub fn id(&self) -> RequestId {
        match self {
            Self::DocumentInfo { id, .. }
            | Self::Page { id, .. }
            | Self::Cancelled(id)
            | Self::Error { id, .. } => *id,
        }
    }
}

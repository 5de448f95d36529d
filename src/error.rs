//! Error taxonomy for the viewer library

/// Errors surfaced by the viewer's library seams.
///
/// The application layer wraps these in `anyhow::Error` with context;
/// the widget turns them into HUD messages.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to load document {name}: {reason}")]
    DocumentLoadFailed { name: String, reason: String },

    #[error("failed to render page {page}: {reason}")]
    PageRenderFailed { page: usize, reason: String },

    #[error("page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("storage unavailable: {reason}")]
    StorageUnavailable { reason: String },

    #[error("print failed: {reason}")]
    PrintFailed { reason: String },

    #[error("download failed: {reason}")]
    DownloadFailed { reason: String },

    #[error("could not open in the system viewer: {reason}")]
    OpenFailed { reason: String },
}

impl ViewerError {
    pub fn load(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::DocumentLoadFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn render(page: usize, reason: impl ToString) -> Self {
        Self::PageRenderFailed {
            page,
            reason: reason.to_string(),
        }
    }

    pub fn storage(reason: impl ToString) -> Self {
        Self::StorageUnavailable {
            reason: reason.to_string(),
        }
    }

    pub fn print(reason: impl ToString) -> Self {
        Self::PrintFailed {
            reason: reason.to_string(),
        }
    }

    pub fn download(reason: impl ToString) -> Self {
        Self::DownloadFailed {
            reason: reason.to_string(),
        }
    }

    pub fn open(reason: impl ToString) -> Self {
        Self::OpenFailed {
            reason: reason.to_string(),
        }
    }

    /// True for errors that leave the document unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DocumentLoadFailed { .. })
    }
}

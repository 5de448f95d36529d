//! Where a document comes from

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ViewerError;

/// A PDF resource handed to the rendering backend
#[derive(Clone)]
pub enum DocumentSource {
    /// A file on disk
    Path(PathBuf),
    /// An in-memory buffer (e.g. read from stdin)
    Bytes { name: String, data: Arc<[u8]> },
}

impl DocumentSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Human readable name, used in the title bar and error messages
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes { .. } => None,
        }
    }

    /// Raw bytes of the original resource
    pub fn read_bytes(&self) -> Result<Arc<[u8]>, ViewerError> {
        match self {
            Self::Path(path) => fs::read(path)
                .map(Arc::from)
                .map_err(|e| ViewerError::load(self.display_name(), e)),
            Self::Bytes { data, .. } => Ok(Arc::clone(data)),
        }
    }

    /// Stable identity of the document, used to namespace stored annotations.
    ///
    /// Files are identified by their canonical path, buffers by their content.
    pub fn document_key(&self) -> String {
        match self {
            Self::Path(path) => {
                let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
                format!("{:x}", md5::compute(resolved.to_string_lossy().as_bytes()))
            }
            Self::Bytes { data, .. } => format!("{:x}", md5::compute(data)),
        }
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes { name, data } => f
                .debug_struct("Bytes")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

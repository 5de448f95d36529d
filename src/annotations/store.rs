//! Durable key-value storage and the per-document annotation list

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};

use crate::error::ViewerError;

use super::model::RectAnnotation;

const ANNOTATION_KEY_PREFIX: &str = "pdfpeek.annotations.";

/// String-to-string storage, shaped like browser local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), ViewerError>;
    fn remove(&mut self, key: &str) -> Result<(), ViewerError>;
}

/// One JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store, starting empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ViewerError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| ViewerError::storage(format!("cannot read {path:?}: {e}")))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| ViewerError::storage(format!("corrupt store {path:?}: {e}")))?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened storage {path:?} with {} keys", entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ViewerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ViewerError::storage(format!("cannot create {parent:?}: {e}"))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ViewerError::storage(e.to_string()))?;
        fs::write(&self.path, content)
            .map_err(|e| ViewerError::storage(format!("cannot write {:?}: {e}", self.path)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ViewerError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), ViewerError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// In-memory store; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ViewerError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ViewerError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Storage key holding the annotation list of one document
pub fn annotation_key(document_key: &str) -> String {
    format!("{ANNOTATION_KEY_PREFIX}{document_key}")
}

pub fn encode_annotations(annotations: &[RectAnnotation]) -> Result<String, ViewerError> {
    serde_json::to_string(annotations).map_err(|e| ViewerError::storage(e.to_string()))
}

pub fn decode_annotations(value: &str) -> Result<Vec<RectAnnotation>, ViewerError> {
    serde_json::from_str(value).map_err(|e| ViewerError::storage(e.to_string()))
}

/// The ordered annotation list of one document, backed by a store.
///
/// Read once on open; the whole list is written back synchronously on every
/// append.
pub struct AnnotationStore {
    store: Box<dyn KeyValueStore>,
    key: String,
    annotations: Vec<RectAnnotation>,
}

impl AnnotationStore {
    pub fn open(store: Box<dyn KeyValueStore>, document_key: &str) -> Self {
        let key = annotation_key(document_key);
        let annotations = match store.get(&key) {
            Ok(Some(value)) => decode_annotations(&value).unwrap_or_else(|e| {
                error!("Ignoring unreadable annotations under {key}: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Annotation storage unavailable, starting empty: {e}");
                Vec::new()
            }
        };

        info!("Loaded {} annotations for {key}", annotations.len());
        Self {
            store,
            key,
            annotations,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn all(&self) -> &[RectAnnotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotations of one page, in creation order
    pub fn for_page(&self, page: usize) -> impl Iterator<Item = &RectAnnotation> {
        self.annotations.iter().filter(move |a| a.page == page)
    }

    /// Append and persist.
    ///
    /// The rectangle is kept in memory even when persisting fails, so the
    /// overlay stays consistent with what the user drew.
    pub fn append(&mut self, annotation: RectAnnotation) -> Result<(), ViewerError> {
        debug!(
            "New annotation on page {}: {}x{} at ({}, {})",
            annotation.page, annotation.width, annotation.height, annotation.x, annotation.y
        );
        self.annotations.push(annotation);
        self.persist()
    }

    fn persist(&mut self) -> Result<(), ViewerError> {
        let encoded = encode_annotations(&self.annotations)?;
        self.store.set(&self.key, encoded)
    }
}

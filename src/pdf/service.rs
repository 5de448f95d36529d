//! Render service - manages worker pool and cache

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use super::backend::PdfBackend;
use super::cache::{CacheKey, PageCache};
use super::request::{PageBitmap, RenderKind, RenderRequest, RenderResponse, RequestId};
use super::source::DocumentSource;
use super::worker::{WorkerContext, render_worker};
use super::{DEFAULT_CACHE_SIZE, DEFAULT_WORKERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    Load,
    Page(usize),
    Thumbnail(usize),
}

/// Worker pool sizing
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub workers: usize,
    pub cache_size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

/// Manages PDF rendering with worker threads and caching.
///
/// Page requests supersede each other: only the response to the most recent
/// page request is ever handed back to the caller. Thumbnail requests are
/// independent.
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, PendingRequest>,
    latest_page: Arc<AtomicU64>,
    cache: Arc<Mutex<PageCache>>,
    num_workers: usize,
    thumbnails_in_flight: HashSet<usize>,
}

impl RenderService {
    /// Spawn workers for `source` and start loading the document
    #[must_use]
    pub fn new(source: DocumentSource, backend: Arc<dyn PdfBackend>, config: RenderConfig) -> Self {
        let cache = Arc::new(Mutex::new(PageCache::new(config.cache_size)));
        let latest_page = Arc::new(AtomicU64::new(0));

        // flume gives MPMC channels: every worker pulls from the same queue.
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let num_workers = config.workers.max(1);
        for _ in 0..num_workers {
            let ctx = WorkerContext {
                backend: Arc::clone(&backend),
                source: source.clone(),
                requests: request_rx.clone(),
                responses: response_tx.clone(),
                cache: Arc::clone(&cache),
                latest_page: Arc::clone(&latest_page),
            };
            std::thread::spawn(move || render_worker(ctx));
        }
        info!(
            "Started {num_workers} render workers for {}",
            source.display_name()
        );

        let mut service = Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            latest_page,
            cache,
            num_workers,
            thumbnails_in_flight: HashSet::new(),
        };
        service.request_document_info();
        service
    }

    fn request_document_info(&mut self) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(RenderRequest::LoadDocument { id });
        self.pending_requests.insert(id, PendingRequest::Load);
        id
    }

    /// Request the main canvas page, superseding any earlier page request
    pub fn request_page(&mut self, page: usize, scale: f32) -> RequestId {
        let id = self.next_id();
        self.latest_page.store(id.0, Ordering::Release);

        let _ = self
            .request_tx
            .send(RenderRequest::Page { id, page, scale });
        self.pending_requests.insert(id, PendingRequest::Page(page));
        id
    }

    /// Request a thumbnail unless one for this page is already in flight
    pub fn request_thumbnail(&mut self, page: usize, scale: f32) -> Option<RequestId> {
        if self.thumbnails_in_flight.contains(&page) {
            return None;
        }

        let id = self.next_id();
        let _ = self
            .request_tx
            .send(RenderRequest::Thumbnail { id, page, scale });
        self.pending_requests
            .insert(id, PendingRequest::Thumbnail(page));
        self.thumbnails_in_flight.insert(page);
        Some(id)
    }

    /// Id of the page request whose result will be displayed
    #[must_use]
    pub fn latest_page_request(&self) -> Option<RequestId> {
        match self.latest_page.load(Ordering::Acquire) {
            0 => None,
            id => Some(RequestId::new(id)),
        }
    }

    /// Get a cached bitmap if available
    #[must_use]
    pub fn cached(&self, page: usize, scale: f32, kind: RenderKind) -> Option<Arc<PageBitmap>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&CacheKey::new(page, scale, kind))
    }

    /// True while any request is still being worked on
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending_requests.is_empty()
    }

    /// Poll for completed render responses without blocking
    pub fn poll_responses(&mut self) -> Vec<RenderResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            self.accept(response, &mut responses);
        }
        responses
    }

    /// Block until at least one response arrives or `timeout` elapses,
    /// then drain whatever else is ready.
    pub fn wait_for_responses(&mut self, timeout: Duration) -> Vec<RenderResponse> {
        let deadline = Instant::now() + timeout;
        let mut responses = vec![];

        while responses.is_empty() && self.has_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.response_rx.recv_timeout(remaining) {
                Ok(response) => self.accept(response, &mut responses),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }

        responses.extend(self.poll_responses());
        responses
    }

    /// Bookkeeping for one response; stale page results are dropped here
    fn accept(&mut self, response: RenderResponse, out: &mut Vec<RenderResponse>) {
        let id = response.id();
        let pending = self.pending_requests.remove(&id);

        match pending {
            Some(PendingRequest::Thumbnail(page)) => {
                self.thumbnails_in_flight.remove(&page);
            }
            Some(PendingRequest::Page(page)) => {
                if Some(id) != self.latest_page_request() {
                    debug!("Dropping stale response for page {page} ({id:?})");
                    return;
                }
            }
            Some(PendingRequest::Load) => {}
            None => {
                debug!("Response for unknown request {id:?}");
                return;
            }
        }

        if matches!(response, RenderResponse::Cancelled(_)) {
            return;
        }
        out.push(response);
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(RenderRequest::Shutdown);
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{FakeBackend, page_color};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn drain(service: &mut RenderService) -> Vec<RenderResponse> {
        let mut all = vec![];
        while service.has_pending() {
            let batch = service.wait_for_responses(TIMEOUT);
            if batch.is_empty() && service.has_pending() {
                panic!("render service stalled");
            }
            all.extend(batch);
        }
        all
    }

    fn service_for(backend: FakeBackend) -> RenderService {
        RenderService::new(
            DocumentSource::from_bytes("fake.pdf", b"%PDF-fake".to_vec()),
            Arc::new(backend),
            RenderConfig {
                workers: 2,
                cache_size: 8,
            },
        )
    }

    #[test]
    fn load_reports_page_count() {
        let mut service = service_for(FakeBackend::with_pages(5));
        let responses = drain(&mut service);

        assert!(matches!(
            responses.as_slice(),
            [RenderResponse::DocumentInfo { page_count: 5, .. }]
        ));
    }

    #[test]
    fn failed_load_is_reported_as_error() {
        let mut service = service_for(FakeBackend::failing("corrupt xref"));
        let responses = drain(&mut service);

        match responses.as_slice() {
            [RenderResponse::Error { error, .. }] => assert!(error.is_fatal()),
            other => panic!("unexpected responses: {other:?}"),
        }
    }

    #[test]
    fn only_latest_page_request_is_delivered() {
        let mut service = service_for(FakeBackend::with_pages(5));
        service.request_page(2, 1.0);
        service.request_page(3, 1.0);
        let latest = service.request_page(4, 1.0);

        let pages: Vec<_> = drain(&mut service)
            .into_iter()
            .filter_map(|r| match r {
                RenderResponse::Page { id, page, bitmap } => Some((id, page, bitmap)),
                _ => None,
            })
            .collect();

        assert_eq!(pages.len(), 1);
        let (id, page, bitmap) = &pages[0];
        assert_eq!(*id, latest);
        assert_eq!(*page, 4);
        assert_eq!(bitmap.surface.pixel(0, 0), Some(page_color(4)));
    }

    #[test]
    fn thumbnails_are_not_superseded() {
        let mut service = service_for(FakeBackend::with_pages(3));
        for page in 1..=3 {
            assert!(service.request_thumbnail(page, 0.2).is_some());
        }
        // already in flight
        assert!(service.request_thumbnail(2, 0.2).is_none());
        service.request_page(1, 1.0);

        let thumbnails = drain(&mut service)
            .into_iter()
            .filter(|r| {
                matches!(r, RenderResponse::Page { bitmap, .. } if bitmap.kind == RenderKind::Thumbnail)
            })
            .count();
        assert_eq!(thumbnails, 3);
        assert!(service.cached(2, 0.2, RenderKind::Thumbnail).is_some());
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let mut service = service_for(FakeBackend::with_pages(2));
        service.request_page(7, 1.0);

        let errors: Vec<_> = drain(&mut service)
            .into_iter()
            .filter_map(|r| match r {
                RenderResponse::Error { error, .. } => Some(error),
                _ => None,
            })
            .collect();
        assert!(matches!(
            errors.as_slice(),
            [crate::error::ViewerError::PageOutOfRange {
                page: 7,
                page_count: 2
            }]
        ));
    }
}

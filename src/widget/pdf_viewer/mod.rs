//! PDF viewer widget: canvas, controls, thumbnails and annotation overlay
//!
//! The widget owns the view state, the render service of its document and
//! the annotation list. Input is translated into [`Command`]s, and the
//! resulting [`Effect`]s drive rendering and re-compositing.

pub mod canvas;
pub mod controls;
mod input;
mod rendering;
pub mod thumbnails;

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use ratatui::layout::Rect;

use crate::actions::{self, HandedOff};
use crate::annotations::{
    AnnotationStore, GestureContext, KeyValueStore, RectAnnotation, RectGesture,
    next_palette_color, paint_annotations, paint_preview,
};
use crate::error::ViewerError;
use crate::pdf::{
    Command, DocumentSource, Effect, PageBitmap, PdfBackend, RenderKind, RenderResponse,
    RenderService, Surface, ViewState,
};
use crate::settings::Settings;
use crate::system_command::SystemCommandExecutor;
use crate::theme::{Base16Palette, current_theme};
use crate::widget::hud_message::{HudMessage, HudMode};

use canvas::{CanvasLayout, DotImage};
use controls::{ControlHitMap, NumberField};
use thumbnails::ThumbnailStrip;

const HUD_NORMAL_DURATION: Duration = Duration::from_secs(2);
const HUD_ERROR_DURATION: Duration = Duration::from_secs(5);

/// What the host should do after an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Redraw,
    Quit,
}

/// Options applied once the document has loaded
#[derive(Debug, Clone, Default)]
pub struct ViewerOptions {
    pub initial_page: Option<usize>,
    pub initial_scale: Option<f32>,
    pub show_thumbnails: bool,
}

pub struct PdfViewer {
    source: DocumentSource,
    title: String,
    settings: Settings,
    pub(crate) state: ViewState,
    service: RenderService,
    annotations: AnnotationStore,
    gesture: RectGesture,
    draw_mode: bool,
    color: String,

    /// Bitmap behind the canvas; its scale may lag the zoom while a
    /// re-render is in flight
    page_bitmap: Option<Arc<PageBitmap>>,
    /// Page bitmap with annotations painted over it
    canvas: Option<Surface>,
    canvas_generation: u64,
    dot_image: Option<DotImage>,
    canvas_layout: Option<CanvasLayout>,

    thumbnails: ThumbnailStrip,
    thumbnail_area: Option<Rect>,
    page_field: NumberField,
    zoom_field: NumberField,
    hit_map: ControlHitMap,

    hud: Option<HudMessage>,
    load_error: Option<String>,
    rendering: bool,
    pending_initial_page: Option<usize>,

    executor: Box<dyn SystemCommandExecutor>,
    /// Keeps temporary files alive while the spooler or viewer reads them
    handed_off: Option<HandedOff>,
    palette: &'static Base16Palette,
}

impl PdfViewer {
    pub fn new(
        source: DocumentSource,
        backend: Arc<dyn PdfBackend>,
        store: Box<dyn KeyValueStore>,
        settings: Settings,
        executor: Box<dyn SystemCommandExecutor>,
        options: ViewerOptions,
    ) -> Self {
        let mut settings = settings;
        for repaired in settings.repair() {
            warn!("Settings: {repaired}");
        }
        let annotations = AnnotationStore::open(store, &source.document_key());
        let service = RenderService::new(source.clone(), backend, settings.render_config());
        let state = ViewState::new(settings.zoom_limits());
        let title = source.display_name();
        let color = settings.annotation_color.clone();

        info!(
            "Opening {title} with {} stored annotations",
            annotations.len()
        );

        let mut viewer = Self {
            source,
            title,
            settings,
            state,
            service,
            annotations,
            gesture: RectGesture::new(),
            draw_mode: false,
            color,
            page_bitmap: None,
            canvas: None,
            canvas_generation: 0,
            dot_image: None,
            canvas_layout: None,
            thumbnails: ThumbnailStrip::default(),
            thumbnail_area: None,
            page_field: NumberField::default(),
            zoom_field: NumberField::default(),
            hit_map: ControlHitMap::default(),
            hud: None,
            load_error: None,
            rendering: false,
            pending_initial_page: options.initial_page,
            executor,
            handed_off: None,
            palette: current_theme(),
        };

        if let Some(scale) = options.initial_scale {
            viewer.apply_command(Command::SetScale(scale));
        }
        if options.show_thumbnails {
            viewer.apply_command(Command::ToggleThumbnails);
        }
        viewer
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn page_count(&self) -> Option<usize> {
        self.state.page_count
    }

    pub fn scale(&self) -> f32 {
        self.state.scale()
    }

    pub fn thumbnails_visible(&self) -> bool {
        self.state.thumbnails_visible
    }

    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    pub fn annotation_color(&self) -> &str {
        &self.color
    }

    pub fn annotations(&self) -> &[RectAnnotation] {
        self.annotations.all()
    }

    pub fn is_drawing(&self) -> bool {
        self.gesture.is_drawing()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn hud_message(&self) -> Option<&HudMessage> {
        self.hud.as_ref()
    }

    /// The composited canvas (page plus annotations)
    pub fn canvas(&self) -> Option<&Surface> {
        self.canvas.as_ref()
    }

    pub fn displayed_page(&self) -> Option<usize> {
        self.page_bitmap.as_ref().map(|b| b.page)
    }

    pub fn thumbnail_count(&self) -> usize {
        self.thumbnails.len()
    }

    /// Apply a navigation command and carry out its effects
    pub fn apply_command(&mut self, cmd: Command) {
        debug!("Viewer command: {cmd:?}");
        let effects = self.state.apply(cmd);
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RenderCurrentPage => self.request_current_page(),
                Effect::RecompositeOverlay => self.recomposite(),
                Effect::RenderThumbnails => self.request_thumbnails(),
                Effect::CancelGesture => {
                    if self.gesture.cancel() {
                        debug!("Discarded drawing in progress");
                        self.recomposite();
                    }
                }
            }
        }
    }

    fn request_current_page(&mut self) {
        let page = self.state.current_page;
        let scale = self.state.scale();

        // A cached bitmap shows immediately; the request still goes out so
        // that any older in-flight render is superseded.
        if let Some(bitmap) = self.service.cached(page, scale, RenderKind::Page) {
            self.show_page(bitmap);
        }
        self.service.request_page(page, scale);
        self.rendering = true;
    }

    fn request_thumbnails(&mut self) {
        let Some(count) = self.state.page_count else {
            return;
        };
        let scale = self.settings.thumbnail_scale;
        let mut requested = 0;
        for page in 1..=count {
            if self.thumbnails.has(page) {
                continue;
            }
            if let Some(bitmap) = self.service.cached(page, scale, RenderKind::Thumbnail) {
                self.thumbnails.insert(bitmap);
            } else if self.service.request_thumbnail(page, scale).is_some() {
                requested += 1;
            }
        }
        debug!("Requested {requested} thumbnails");
    }

    /// Handle finished renders; returns true if anything visible changed
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        for response in self.service.poll_responses() {
            self.handle_response(response);
            changed = true;
        }
        if self.hud.as_ref().is_some_and(HudMessage::is_expired) {
            self.hud = None;
            changed = true;
        }
        changed
    }

    /// Block until no render is outstanding or `timeout` passes.
    ///
    /// Returns true if the viewer became idle.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.service.has_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            for response in self.service.wait_for_responses(remaining) {
                self.handle_response(response);
            }
        }
        true
    }

    fn handle_response(&mut self, response: RenderResponse) {
        match response {
            RenderResponse::DocumentInfo {
                page_count, title, ..
            } => {
                info!("Document loaded: {page_count} pages");
                if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
                    self.title = title;
                }
                if page_count == 0 {
                    self.fail_load(ViewerError::load(&self.title, "document has no pages"));
                    return;
                }
                self.apply_command(Command::SetPageCount(page_count));
                if let Some(page) = self.pending_initial_page.take() {
                    self.apply_command(Command::GoToPage(page));
                }
            }
            RenderResponse::Page { bitmap, .. } => match bitmap.kind {
                RenderKind::Page => {
                    self.rendering = false;
                    self.show_page(bitmap);
                }
                RenderKind::Thumbnail => self.thumbnails.insert(bitmap),
            },
            RenderResponse::Error { error, .. } => {
                if error.is_fatal() {
                    self.fail_load(error);
                } else {
                    warn!("Render failed: {error}");
                    self.rendering = false;
                    self.show_error(error.to_string());
                }
            }
            RenderResponse::Cancelled(_) => {}
        }
    }

    fn fail_load(&mut self, error: ViewerError) {
        error!("{error}");
        let message = error.to_string();
        self.hud = Some(HudMessage::persistent(message.clone(), HudMode::Error));
        self.load_error = Some(message);
        self.rendering = false;
    }

    fn show_page(&mut self, bitmap: Arc<PageBitmap>) {
        if bitmap.page != self.state.current_page {
            debug!(
                "Ignoring bitmap of page {} while on page {}",
                bitmap.page, self.state.current_page
            );
            return;
        }
        self.page_bitmap = Some(bitmap);
        self.recomposite();
    }

    /// Copy the page bitmap into the canvas and stroke the annotations of
    /// the current page over it
    fn recomposite(&mut self) {
        let Some(bitmap) = &self.page_bitmap else {
            return;
        };

        let canvas = self.canvas.get_or_insert_with(Surface::default);
        canvas.copy_from(&bitmap.surface);
        paint_annotations(canvas, self.annotations.all(), bitmap.page, bitmap.scale);
        if let Some(preview) = self.gesture.in_progress() {
            paint_preview(canvas, &preview, bitmap.scale);
        }
        self.canvas_generation += 1;
    }

    /// Page, scale and color a new rectangle is recorded with
    fn gesture_context(&self) -> Option<GestureContext> {
        let bitmap = self.page_bitmap.as_ref()?;
        Some(GestureContext {
            page: bitmap.page,
            scale: bitmap.scale,
            color: self.color.clone(),
        })
    }

    fn commit_annotation(&mut self, rect: Option<RectAnnotation>) {
        let Some(rect) = rect else {
            return;
        };
        if let Err(e) = self.annotations.append(rect) {
            error!("Could not persist annotation: {e}");
            self.show_error(format!("Annotation not saved: {e}"));
        }
        self.apply_command(Command::AnnotationsChanged);
    }

    pub fn toggle_draw_mode(&mut self) {
        self.draw_mode = !self.draw_mode;
        if !self.draw_mode && self.gesture.cancel() {
            self.recomposite();
        }
        let state = if self.draw_mode { "on" } else { "off" };
        self.show_info(format!("Draw mode {state}"));
    }

    pub fn cycle_color(&mut self) {
        self.color = next_palette_color(&self.color).to_string();
        self.show_info(format!("Annotation color {}", self.color));
    }

    pub fn print(&mut self) {
        match actions::print_document(
            &self.source,
            self.canvas.as_ref(),
            &self.settings,
            self.executor.as_ref(),
        ) {
            Ok(job) => {
                self.handed_off = Some(job);
                self.show_info("Sent to printer");
            }
            Err(e) => {
                error!("{e}");
                self.show_error(e.to_string());
            }
        }
    }

    pub fn download(&mut self) {
        match actions::download_document(&self.source, &self.settings) {
            Ok(path) => self.show_info(format!("Saved {}", path.display())),
            Err(e) => {
                error!("{e}");
                self.show_error(e.to_string());
            }
        }
    }

    pub fn open_externally(&mut self) {
        match actions::open_externally(&self.source, self.executor.as_ref()) {
            Ok(file) => {
                self.handed_off = Some(file);
                self.show_info("Opened in system viewer");
            }
            Err(e) => {
                error!("{e}");
                self.show_error(e.to_string());
            }
        }
    }

    pub fn system_command_executor(&self) -> &dyn SystemCommandExecutor {
        self.executor.as_ref()
    }

    pub fn show_info(&mut self, message: impl Into<String>) {
        if self.load_error.is_some() {
            return;
        }
        self.hud = Some(HudMessage::new(message, HUD_NORMAL_DURATION, HudMode::Normal));
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        if self.load_error.is_some() {
            return;
        }
        self.hud = Some(HudMessage::new(message, HUD_ERROR_DURATION, HudMode::Error));
    }
}

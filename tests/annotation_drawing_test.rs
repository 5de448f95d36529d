use std::sync::Arc;
use std::time::Duration;

use pdfpeek::annotations::{JsonFileStore, MemoryStore};
use pdfpeek::event_source::{KeyModifiers, ModifierKeyCode, SimulatedEventSource};
use pdfpeek::main_app::App;
use pdfpeek::pdf::DocumentSource;
use pdfpeek::settings::Settings;
use pdfpeek::system_command::MockSystemCommandExecutor;
use pdfpeek::test_utils::test_helpers::{FakeBackend, TestScenarioBuilder, create_test_terminal};
use pdfpeek::widget::pdf_viewer::{PdfViewer, ViewerOptions};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

// An 82x29 terminal leaves an 80x24 canvas at column 1, row 2, which shows a
// fake page at one surface pixel per dot.
const WIDTH: u16 = 82;
const HEIGHT: u16 = 29;

/// Terminal cell showing the surface point (x, y) at 100%
fn cell(x: u16, y: u16) -> (u16, u16) {
    (1 + x, 2 + y / 2)
}

fn document() -> DocumentSource {
    DocumentSource::from_bytes("drawing.pdf", b"%PDF-drawing".to_vec())
}

fn open_app(store: Box<dyn pdfpeek::annotations::KeyValueStore>) -> (App, Terminal<TestBackend>) {
    let mut viewer = PdfViewer::new(
        document(),
        Arc::new(FakeBackend::with_pages(2)),
        store,
        Settings::default(),
        Box::new(MockSystemCommandExecutor::new()),
        ViewerOptions::default(),
    );
    assert!(viewer.wait_until_idle(TIMEOUT));

    let mut app = App::new(viewer);
    let mut terminal = create_test_terminal(WIDTH, HEIGHT);
    terminal.draw(|f| app.draw(f)).unwrap();
    (app, terminal)
}

fn drag(app: &mut App, from: (u16, u16), to: (u16, u16), modifiers: KeyModifiers) {
    let (fx, fy) = cell(from.0, from.1);
    let (tx, ty) = cell(to.0, to.1);
    app.handle_event(&SimulatedEventSource::mouse_down(fx, fy, modifiers));
    app.handle_event(&SimulatedEventSource::mouse_drag(tx, ty, modifiers));
    app.handle_event(&SimulatedEventSource::mouse_up(tx, ty, modifiers));
}

#[test]
fn ctrl_drag_records_normalized_rectangle() {
    let (mut app, _terminal) = open_app(Box::new(MemoryStore::new()));

    // dragged up and to the left
    drag(&mut app, (50, 40), (10, 10), KeyModifiers::CONTROL);

    let annotations = app.viewer().annotations();
    assert_eq!(annotations.len(), 1);
    let rect = &annotations[0];
    assert_eq!(rect.page, 1);
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (10.0, 10.0, 40.0, 30.0));
    assert_eq!(rect.color, "#ff0000");
    assert_eq!(rect.scale, 1.0);
}

#[test]
fn plain_drag_draws_nothing() {
    let (mut app, _terminal) = open_app(Box::new(MemoryStore::new()));

    drag(&mut app, (10, 10), (50, 40), KeyModifiers::empty());

    assert!(app.viewer().annotations().is_empty());
    assert!(!app.viewer().is_drawing());
}

#[test]
fn draw_mode_draws_without_modifier() {
    let (mut app, _terminal) = open_app(Box::new(MemoryStore::new()));

    app.handle_event(&SimulatedEventSource::char_key('a'));
    assert!(app.viewer().draw_mode());
    drag(&mut app, (10, 10), (50, 40), KeyModifiers::empty());

    assert_eq!(app.viewer().annotations().len(), 1);
}

#[test]
fn releasing_modifier_finishes_rectangle() {
    let (mut app, _terminal) = open_app(Box::new(MemoryStore::new()));

    let (fx, fy) = cell(10, 10);
    let (tx, ty) = cell(30, 20);
    app.handle_event(&SimulatedEventSource::mouse_down(fx, fy, KeyModifiers::CONTROL));
    app.handle_event(&SimulatedEventSource::mouse_drag(tx, ty, KeyModifiers::CONTROL));
    assert!(app.viewer().is_drawing());

    app.handle_event(&SimulatedEventSource::modifier_release(
        ModifierKeyCode::LeftControl,
    ));

    assert!(!app.viewer().is_drawing());
    let rect = &app.viewer().annotations()[0];
    assert_eq!((rect.width, rect.height), (20.0, 10.0));

    // the button coming up afterwards does not add a second one
    app.handle_event(&SimulatedEventSource::mouse_up(tx, ty, KeyModifiers::empty()));
    assert_eq!(app.viewer().annotations().len(), 1);
}

#[test]
fn drag_without_modifier_finishes_rectangle() {
    let (mut app, _terminal) = open_app(Box::new(MemoryStore::new()));

    let scenario = TestScenarioBuilder::new().drag_without_release(
        cell(10, 10),
        cell(30, 20),
        KeyModifiers::CONTROL,
    );
    for event in scenario.events() {
        app.handle_event(event);
    }
    assert!(app.viewer().is_drawing());

    // most terminals only report the let-go modifier with the next mouse event
    let (lx, ly) = cell(60, 40);
    app.handle_event(&SimulatedEventSource::mouse_drag(lx, ly, KeyModifiers::empty()));

    assert!(!app.viewer().is_drawing());
    let annotations = app.viewer().annotations();
    assert_eq!(annotations.len(), 1);
    let rect = &annotations[0];
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (10.0, 10.0, 20.0, 10.0));

    app.handle_event(&SimulatedEventSource::mouse_up(lx, ly, KeyModifiers::empty()));
    assert_eq!(app.viewer().annotations().len(), 1);
}

#[test]
fn escape_discards_drawing_in_progress() {
    let (mut app, _terminal) = open_app(Box::new(MemoryStore::new()));

    let (fx, fy) = cell(10, 10);
    app.handle_event(&SimulatedEventSource::mouse_down(fx, fy, KeyModifiers::CONTROL));
    assert!(app.viewer().is_drawing());
    app.handle_event(&SimulatedEventSource::key_event(
        pdfpeek::event_source::KeyCode::Esc,
        KeyModifiers::empty(),
    ));

    assert!(!app.viewer().is_drawing());
    assert!(app.viewer().annotations().is_empty());
}

#[test]
fn annotations_survive_reopening_the_document() {
    let dir = TempDir::new().unwrap();
    let storage = dir.path().join("storage.json");

    {
        let (mut app, _terminal) = open_app(Box::new(JsonFileStore::open(&storage).unwrap()));
        drag(&mut app, (10, 10), (50, 40), KeyModifiers::CONTROL);
        assert_eq!(app.viewer().annotations().len(), 1);
    }

    let (app, _terminal) = open_app(Box::new(JsonFileStore::open(&storage).unwrap()));
    let annotations = app.viewer().annotations();
    assert_eq!(annotations.len(), 1);
    let rect = &annotations[0];
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (10.0, 10.0, 40.0, 30.0));
}

#[test]
fn rectangle_is_visible_on_the_canvas() {
    let (mut app, mut terminal) = open_app(Box::new(MemoryStore::new()));
    drag(&mut app, (10, 10), (50, 40), KeyModifiers::CONTROL);

    let canvas = app.viewer().canvas().unwrap();
    assert_eq!(canvas.pixel(10, 10), Some(image::Rgb([255, 0, 0])));
    assert_eq!(canvas.pixel(49, 39), Some(image::Rgb([255, 0, 0])));

    terminal.draw(|f| app.draw(f)).unwrap();
    let (x, y) = cell(10, 10);
    let drawn = &terminal.backend().buffer()[(x, y)];
    assert_eq!(drawn.fg, ratatui::style::Color::Rgb(255, 0, 0));
}

#[test]
fn annotations_belong_to_their_page() {
    let (mut app, mut terminal) = open_app(Box::new(MemoryStore::new()));
    drag(&mut app, (10, 10), (50, 40), KeyModifiers::CONTROL);

    app.handle_event(&SimulatedEventSource::char_key('n'));
    assert!(app.viewer_mut().wait_until_idle(TIMEOUT));
    terminal.draw(|f| app.draw(f)).unwrap();

    assert_eq!(app.viewer().displayed_page(), Some(2));
    let canvas = app.viewer().canvas().unwrap();
    assert_ne!(canvas.pixel(10, 10), Some(image::Rgb([255, 0, 0])));
}

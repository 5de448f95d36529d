use std::sync::Arc;
use std::time::Duration;

use pdfpeek::annotations::MemoryStore;
use pdfpeek::event_source::{KeyModifiers, SimulatedEventSource};
use pdfpeek::main_app::{App, run_app_with_event_source};
use pdfpeek::pdf::DocumentSource;
use pdfpeek::settings::Settings;
use pdfpeek::system_command::MockSystemCommandExecutor;
use pdfpeek::test_utils::test_helpers::{
    FakeBackend, TestScenarioBuilder, capture_terminal_state, create_test_terminal, page_color,
};
use pdfpeek::widget::pdf_viewer::{PdfViewer, ViewerOptions};

const TIMEOUT: Duration = Duration::from_secs(5);

fn viewer_with(pages: usize, options: ViewerOptions) -> PdfViewer {
    let mut viewer = PdfViewer::new(
        DocumentSource::from_bytes("manual.pdf", b"%PDF-manual".to_vec()),
        Arc::new(FakeBackend::with_pages(pages)),
        Box::new(MemoryStore::new()),
        Settings::default(),
        Box::new(MockSystemCommandExecutor::new()),
        options,
    );
    assert!(viewer.wait_until_idle(TIMEOUT));
    viewer
}

fn app(pages: usize) -> App {
    App::new(viewer_with(pages, ViewerOptions::default()))
}

#[test]
fn paging_stops_at_both_ends() {
    let mut app = app(3);
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .next_page(5)
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.viewer().current_page(), 3);

    let mut events = TestScenarioBuilder::new().prev_page(7).quit().build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.viewer().current_page(), 1);
}

#[test]
fn page_field_jumps_and_clamps() {
    let mut app = app(12);
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .press_char('g')
        .type_digits("7")
        .press_enter()
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.viewer().current_page(), 7);

    let mut events = TestScenarioBuilder::new()
        .press_char('g')
        .type_digits("99")
        .press_enter()
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.viewer().current_page(), 12);
}

#[test]
fn escape_leaves_page_field_unchanged() {
    let mut app = app(5);
    app.handle_event(&SimulatedEventSource::char_key('g'));
    app.handle_event(&SimulatedEventSource::char_key('4'));
    app.handle_event(&SimulatedEventSource::key_event(
        pdfpeek::event_source::KeyCode::Esc,
        KeyModifiers::empty(),
    ));
    app.handle_event(&SimulatedEventSource::key_event(
        pdfpeek::event_source::KeyCode::Enter,
        KeyModifiers::empty(),
    ));
    assert_eq!(app.viewer().current_page(), 1);
}

#[test]
fn zoom_stays_within_limits() {
    let mut app = app(1);
    for _ in 0..30 {
        app.handle_event(&SimulatedEventSource::char_key('+'));
    }
    assert!((app.viewer().scale() - 2.0).abs() < f32::EPSILON);

    for _ in 0..30 {
        app.handle_event(&SimulatedEventSource::char_key('-'));
    }
    assert!((app.viewer().scale() - 0.5).abs() < f32::EPSILON);

    app.handle_event(&SimulatedEventSource::char_key('0'));
    assert!((app.viewer().scale() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn zoom_rerenders_at_new_scale() {
    let mut app = app(1);
    app.handle_event(&SimulatedEventSource::char_key('+'));
    assert!(app.viewer_mut().wait_until_idle(TIMEOUT));

    let canvas = app.viewer().canvas().unwrap();
    // 80x48 point page at 110%
    assert!(canvas.width() >= 88 && canvas.height() >= 53);
    assert_eq!(canvas.pixel(0, 0), Some(page_color(1)));
}

#[test]
fn ctrl_wheel_zooms_and_plain_wheel_pages() {
    let mut app = app(4);
    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();

    app.handle_event(&SimulatedEventSource::scroll(true, 40, 10, KeyModifiers::empty()));
    assert_eq!(app.viewer().current_page(), 2);

    app.handle_event(&SimulatedEventSource::scroll(false, 40, 10, KeyModifiers::CONTROL));
    assert!((app.viewer().scale() - 1.1).abs() < 1e-4);
    assert_eq!(app.viewer().current_page(), 2);
}

#[test]
fn clicking_pager_buttons_navigates() {
    let mut app = app(3);
    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();

    let screen = capture_terminal_state(&terminal);
    let pager = screen.lines().nth(28).unwrap();
    let next = pager.find("[Next]").unwrap() as u16;
    let previous = pager.find("[Previous]").unwrap() as u16;

    for event in SimulatedEventSource::click(next + 1, 28) {
        app.handle_event(&event);
    }
    assert_eq!(app.viewer().current_page(), 2);

    terminal.draw(|f| app.draw(f)).unwrap();
    for event in SimulatedEventSource::click(previous + 1, 28) {
        app.handle_event(&event);
    }
    assert_eq!(app.viewer().current_page(), 1);

    // Previous is disabled on the first page
    terminal.draw(|f| app.draw(f)).unwrap();
    for event in SimulatedEventSource::click(previous + 1, 28) {
        app.handle_event(&event);
    }
    assert_eq!(app.viewer().current_page(), 1);
}

#[test]
fn thumbnails_render_and_navigate() {
    let mut viewer = viewer_with(
        3,
        ViewerOptions {
            show_thumbnails: true,
            ..ViewerOptions::default()
        },
    );
    assert!(viewer.wait_until_idle(TIMEOUT));
    assert!(viewer.thumbnails_visible());
    assert_eq!(viewer.thumbnail_count(), 3);

    let mut app = App::new(viewer);
    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();

    // second cell of the strip, below the toolbar
    for event in SimulatedEventSource::click(4, 1 + 9 + 4) {
        app.handle_event(&event);
    }
    assert_eq!(app.viewer().current_page(), 2);

    app.handle_event(&SimulatedEventSource::char_key('t'));
    assert!(!app.viewer().thumbnails_visible());
}

#[test]
fn wheel_over_thumbnails_scrolls_the_strip() {
    let viewer = viewer_with(
        10,
        ViewerOptions {
            show_thumbnails: true,
            ..ViewerOptions::default()
        },
    );
    let mut app = App::new(viewer);
    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();

    let wheel = TestScenarioBuilder::new()
        .scroll(true, 4, 5, KeyModifiers::empty())
        .scroll(true, 4, 5, KeyModifiers::empty())
        .scroll(true, 4, 5, KeyModifiers::empty())
        .scroll(true, 4, 5, KeyModifiers::empty());
    for event in wheel.events() {
        app.handle_event(event);
    }
    // the strip scrolls, the document stays put
    assert_eq!(app.viewer().current_page(), 1);

    terminal.draw(|f| app.draw(f)).unwrap();
    terminal.draw(|f| app.draw(f)).unwrap();

    // top cell now shows page 5
    for event in TestScenarioBuilder::new().click(4, 5).events() {
        app.handle_event(event);
    }
    assert_eq!(app.viewer().current_page(), 5);
}

#[test]
fn inverted_zoom_bounds_are_repaired() {
    let settings = Settings {
        min_scale: 3.0,
        max_scale: 0.5,
        default_scale: f32::NAN,
        ..Settings::default()
    };
    let mut viewer = PdfViewer::new(
        DocumentSource::from_bytes("manual.pdf", b"%PDF-manual".to_vec()),
        Arc::new(FakeBackend::with_pages(2)),
        Box::new(MemoryStore::new()),
        settings,
        Box::new(MockSystemCommandExecutor::new()),
        ViewerOptions::default(),
    );
    assert!(viewer.wait_until_idle(TIMEOUT));

    for _ in 0..40 {
        viewer.handle_event(&SimulatedEventSource::char_key('+'));
    }
    assert!((viewer.scale() - 3.0).abs() < 1e-4);
    for _ in 0..40 {
        viewer.handle_event(&SimulatedEventSource::char_key('-'));
    }
    assert!((viewer.scale() - 0.5).abs() < 1e-4);
}

#[test]
fn initial_page_and_zoom_apply_after_load() {
    let mut viewer = viewer_with(
        10,
        ViewerOptions {
            initial_page: Some(4),
            initial_scale: Some(1.5),
            show_thumbnails: false,
        },
    );
    assert!(viewer.wait_until_idle(TIMEOUT));
    assert_eq!(viewer.current_page(), 4);
    assert_eq!(viewer.displayed_page(), Some(4));
    assert!((viewer.scale() - 1.5).abs() < f32::EPSILON);
}

#[test]
fn failed_load_shows_message_and_ignores_navigation() {
    let mut viewer = PdfViewer::new(
        DocumentSource::from_bytes("broken.pdf", b"not a pdf".to_vec()),
        Arc::new(FakeBackend::failing("no trailer found")),
        Box::new(MemoryStore::new()),
        Settings::default(),
        Box::new(MockSystemCommandExecutor::new()),
        ViewerOptions::default(),
    );
    assert!(viewer.wait_until_idle(TIMEOUT));
    let mut app = App::new(viewer);

    app.handle_event(&SimulatedEventSource::char_key('n'));
    app.handle_event(&SimulatedEventSource::char_key('+'));
    assert_eq!(app.viewer().current_page(), 1);
    assert_eq!(app.viewer().page_count(), None);

    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Could not open document"));
    assert!(screen.contains("no trailer found"));
}

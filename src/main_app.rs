use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use log::{debug, info};
use ratatui::Terminal;

use crate::event_source::EventSource;
use crate::widget::pdf_viewer::{PdfViewer, ViewerAction};

/// Upper bound of events handled between two frames
const MAX_EVENTS_PER_FRAME: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Top level application: one viewer filling the terminal
pub struct App {
    viewer: PdfViewer,
}

impl App {
    pub fn new(viewer: PdfViewer) -> Self {
        Self { viewer }
    }

    pub fn viewer(&self) -> &PdfViewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut PdfViewer {
        &mut self.viewer
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame) {
        let area = f.area();
        self.viewer.render(f, area);
    }

    /// Route one terminal event; returns `Some(Quit)` when the app should exit
    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press
                && key.modifiers.contains(KeyModifiers::CONTROL)
                && key.code == KeyCode::Char('c')
            {
                return Some(AppAction::Quit);
            }
        }

        match self.viewer.handle_event(event) {
            Some(ViewerAction::Quit) => Some(AppAction::Quit),
            Some(ViewerAction::Redraw) | None => None,
        }
    }

    /// Collect finished renders and expire messages; true if a redraw is due
    pub fn tick(&mut self) -> bool {
        self.viewer.tick()
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;

    info!("Entering event loop");
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;

        while events_processed < MAX_EVENTS_PER_FRAME && event_source.poll(Duration::from_millis(0))? {
            let event = event_source.read()?;
            events_processed += 1;

            if let Event::Mouse(mouse) = &event {
                if matches!(
                    mouse.kind,
                    MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight | MouseEventKind::Moved
                ) {
                    continue;
                }
            }

            if app.handle_event(&event) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        if should_quit {
            debug!("Quit requested");
            return Ok(());
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if last_tick.elapsed() >= tick_rate {
            if app.tick() {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::annotations::MemoryStore;
    use crate::pdf::DocumentSource;
    use crate::settings::Settings;
    use crate::system_command::MockSystemCommandExecutor;
    use crate::test_utils::test_helpers::{FakeBackend, TestScenarioBuilder, create_test_terminal};
    use crate::widget::pdf_viewer::ViewerOptions;

    fn app(pages: usize) -> App {
        let mut viewer = PdfViewer::new(
            DocumentSource::from_bytes("fake.pdf", b"%PDF-fake".to_vec()),
            Arc::new(FakeBackend::with_pages(pages)),
            Box::new(MemoryStore::new()),
            Settings::default(),
            Box::new(MockSystemCommandExecutor::new()),
            ViewerOptions::default(),
        );
        assert!(viewer.wait_until_idle(Duration::from_secs(5)));
        App::new(viewer)
    }

    #[test]
    fn ctrl_c_quits_while_editing_a_field() {
        let mut app = app(3);
        app.handle_event(&crate::event_source::SimulatedEventSource::char_key('g'));
        let quit = app.handle_event(&crate::event_source::SimulatedEventSource::ctrl_char_key('c'));
        assert_eq!(quit, Some(AppAction::Quit));
    }

    #[test]
    fn event_loop_runs_until_quit() {
        let mut app = app(5);
        let mut terminal = create_test_terminal(100, 30);
        let mut events = TestScenarioBuilder::new().next_page(3).prev_page(1).quit().build();

        run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
        assert_eq!(app.viewer().current_page(), 3);
    }
}

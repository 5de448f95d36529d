pub mod test_helpers {
    use crate::error::ViewerError;
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use crate::pdf::{DocumentHandle, DocumentSource, PdfBackend, Surface, Viewport};
    use image::Rgb;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Page size in points of every fake page: fills an 80x24 canvas at 100%
    pub const FAKE_PAGE_WIDTH: f32 = 80.0;
    pub const FAKE_PAGE_HEIGHT: f32 = 48.0;

    /// Solid fill of a fake page, distinct per page
    pub fn page_color(page: usize) -> Rgb<u8> {
        let n = (page % 8) as u8;
        Rgb([40 + n * 20, 180 - n * 10, 90 + n * 5])
    }

    /// Backend that paints each page in a flat color instead of parsing PDF
    #[derive(Debug, Clone)]
    pub struct FakeBackend {
        pages: usize,
        failure: Option<String>,
    }

    impl FakeBackend {
        pub fn with_pages(pages: usize) -> Self {
            Self {
                pages,
                failure: None,
            }
        }

        /// Backend whose documents never open
        pub fn failing(reason: impl Into<String>) -> Self {
            Self {
                pages: 0,
                failure: Some(reason.into()),
            }
        }
    }

    impl PdfBackend for FakeBackend {
        fn open(&self, source: &DocumentSource) -> Result<Box<dyn DocumentHandle>, ViewerError> {
            if let Some(reason) = &self.failure {
                return Err(ViewerError::load(source.display_name(), reason));
            }
            Ok(Box::new(FakeDocument { pages: self.pages }))
        }
    }

    struct FakeDocument {
        pages: usize,
    }

    impl DocumentHandle for FakeDocument {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn viewport(&self, _index: usize, scale: f32) -> Result<Viewport, ViewerError> {
            Ok(Viewport::from_page_size(
                FAKE_PAGE_WIDTH,
                FAKE_PAGE_HEIGHT,
                scale,
            ))
        }

        fn render(&self, index: usize, _scale: f32, surface: &mut Surface) -> Result<(), ViewerError> {
            surface.fill(page_color(index + 1));
            Ok(())
        }
    }

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_enter(mut self) -> Self {
            self.events.push(SimulatedEventSource::key_event(
                KeyCode::Enter,
                KeyModifiers::empty(),
            ));
            self
        }

        /// Type a number into whichever field is being edited
        pub fn type_digits(mut self, digits: &str) -> Self {
            for c in digits.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        /// Next page n times (press 'n')
        pub fn next_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('n'));
            }
            self
        }

        /// Previous page n times (press 'p')
        pub fn prev_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('p'));
            }
            self
        }

        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events.extend(SimulatedEventSource::click(column, row));
            self
        }

        /// Press at `from`, drag to `to` and let go, holding `modifiers`
        pub fn drag(mut self, from: (u16, u16), to: (u16, u16), modifiers: KeyModifiers) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_down(from.0, from.1, modifiers));
            self.events
                .push(SimulatedEventSource::mouse_drag(to.0, to.1, modifiers));
            self.events
                .push(SimulatedEventSource::mouse_up(to.0, to.1, modifiers));
            self
        }

        /// Press at `from` and drag to `to` without letting go
        pub fn drag_without_release(
            mut self,
            from: (u16, u16),
            to: (u16, u16),
            modifiers: KeyModifiers,
        ) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_down(from.0, from.1, modifiers));
            self.events
                .push(SimulatedEventSource::mouse_drag(to.0, to.1, modifiers));
            self
        }

        pub fn scroll(mut self, down: bool, column: u16, row: u16, modifiers: KeyModifiers) -> Self {
            self.events
                .push(SimulatedEventSource::scroll(down, column, row, modifiers));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::char_key('q'));
            self
        }

        pub fn events(&self) -> &[Event] {
            &self.events
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
            lines.pop();
        }

        lines.join("\n")
    }
}

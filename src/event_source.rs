use anyhow::Result;
pub use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode, MouseButton,
    MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real keyboard and mouse event source using crossterm
pub struct KeyboardEventSource;

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Simulated event source for testing
pub struct SimulatedEventSource {
    pub(crate) events: Vec<Event>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    /// Helper method to create a key event
    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    /// Helper method to create a simple character key event
    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    /// Helper method to create a Ctrl+char key event
    pub fn ctrl_char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Release of a modifier key, as reported by terminals with the
    /// keyboard enhancement protocol
    pub fn modifier_release(code: ModifierKeyCode) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Modifier(code),
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Release,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    pub fn mouse_event(kind: MouseEventKind, column: u16, row: u16, modifiers: KeyModifiers) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers,
        })
    }

    pub fn mouse_down(column: u16, row: u16, modifiers: KeyModifiers) -> Event {
        Self::mouse_event(MouseEventKind::Down(MouseButton::Left), column, row, modifiers)
    }

    pub fn mouse_drag(column: u16, row: u16, modifiers: KeyModifiers) -> Event {
        Self::mouse_event(MouseEventKind::Drag(MouseButton::Left), column, row, modifiers)
    }

    pub fn mouse_up(column: u16, row: u16, modifiers: KeyModifiers) -> Event {
        Self::mouse_event(MouseEventKind::Up(MouseButton::Left), column, row, modifiers)
    }

    /// Left click without modifiers
    pub fn click(column: u16, row: u16) -> Vec<Event> {
        vec![
            Self::mouse_down(column, row, KeyModifiers::empty()),
            Self::mouse_up(column, row, KeyModifiers::empty()),
        ]
    }

    pub fn scroll(down: bool, column: u16, row: u16, modifiers: KeyModifiers) -> Event {
        let kind = if down {
            MouseEventKind::ScrollDown
        } else {
            MouseEventKind::ScrollUp
        };
        Self::mouse_event(kind, column, row, modifiers)
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<Event> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Ok(event)
        } else {
            // Return a quit event if we've exhausted all events
            Ok(SimulatedEventSource::char_key('q'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_event_source() {
        let mut events = vec![
            SimulatedEventSource::char_key('n'),
            SimulatedEventSource::ctrl_char_key('c'),
        ];
        events.extend(SimulatedEventSource::click(3, 4));

        let mut source = SimulatedEventSource::new(events);

        assert!(source.poll(Duration::from_millis(0)).unwrap());

        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('n'));
            assert!(key.modifiers.is_empty());
        }

        if let Event::Key(key) = source.read().unwrap() {
            assert_eq!(key.code, KeyCode::Char('c'));
            assert!(key.modifiers.contains(KeyModifiers::CONTROL));
        }

        match source.read().unwrap() {
            Event::Mouse(mouse) => {
                assert_eq!(mouse.kind, MouseEventKind::Down(MouseButton::Left));
                assert_eq!((mouse.column, mouse.row), (3, 4));
            }
            other => panic!("expected mouse event, got {other:?}"),
        }
        assert!(matches!(source.read().unwrap(), Event::Mouse(_)));

        // No more events
        assert!(!source.poll(Duration::from_millis(0)).unwrap());
    }
}

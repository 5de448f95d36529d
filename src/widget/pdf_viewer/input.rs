//! Keyboard and mouse handling for the viewer

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::debug;

use crate::annotations::PointerButton;
use crate::pdf::{Command, ScrollDirection};

use super::controls::Control;
use super::thumbnails::CELL_HEIGHT;
use super::{PdfViewer, ViewerAction};

impl PdfViewer {
    pub fn handle_event(&mut self, ev: &Event) -> Option<ViewerAction> {
        match ev {
            Event::Key(key) => self.handle_key_event(*key),
            Event::Mouse(mouse) => self.handle_mouse_event(*mouse),
            Event::Resize(_, _) => Some(ViewerAction::Redraw),
            _ => None,
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Option<ViewerAction> {
        if key.kind == KeyEventKind::Release {
            return self.handle_key_release(key);
        }

        if self.page_field.is_editing() || self.zoom_field.is_editing() {
            return self.handle_field_key(key);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(ViewerAction::Quit);
        }

        match key.code {
            KeyCode::Char('q') => return Some(ViewerAction::Quit),
            KeyCode::Esc => return self.handle_escape(),
            _ => {}
        }

        // Nothing but quitting works on a document that failed to load
        if self.load_error.is_some() {
            return None;
        }

        match key.code {
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                self.apply_command(Command::NextPage);
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                self.apply_command(Command::PrevPage);
            }
            KeyCode::Home => self.apply_command(Command::FirstPage),
            KeyCode::End => self.apply_command(Command::LastPage),
            KeyCode::Char('+' | '=') => self.apply_command(Command::ZoomIn),
            KeyCode::Char('-') => self.apply_command(Command::ZoomOut),
            KeyCode::Char('0') => self.apply_command(Command::ResetZoom),
            KeyCode::Char('g') => self.start_editing(Control::PageField),
            KeyCode::Char('z') => self.start_editing(Control::ZoomField),
            KeyCode::Char('t') => self.apply_command(Command::ToggleThumbnails),
            KeyCode::Char('a') => self.toggle_draw_mode(),
            KeyCode::Char('c') => self.cycle_color(),
            KeyCode::Char('P') => self.print(),
            KeyCode::Char('d') => self.download(),
            KeyCode::Char('o') => self.open_externally(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.apply_command(Command::Pan(ScrollDirection::Down));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.apply_command(Command::Pan(ScrollDirection::Up));
            }
            KeyCode::Char('H') => self.apply_command(Command::Pan(ScrollDirection::Left)),
            KeyCode::Char('L') => self.apply_command(Command::Pan(ScrollDirection::Right)),
            _ => return None,
        }
        Some(ViewerAction::Redraw)
    }

    /// Key releases only arrive with the keyboard enhancement protocol; a
    /// released drawing modifier ends a modifier-started gesture
    fn handle_key_release(&mut self, key: KeyEvent) -> Option<ViewerAction> {
        let KeyCode::Modifier(code) = key.code else {
            return None;
        };
        if !self.settings.draw_modifier.matches_key(code) {
            return None;
        }
        let rect = self.gesture.modifier_released()?;
        debug!("Drawing modifier released, finishing rectangle");
        self.commit_annotation(Some(rect));
        Some(ViewerAction::Redraw)
    }

    fn handle_escape(&mut self) -> Option<ViewerAction> {
        if self.gesture.cancel() {
            self.recomposite();
            return Some(ViewerAction::Redraw);
        }
        if self.draw_mode {
            self.toggle_draw_mode();
            return Some(ViewerAction::Redraw);
        }
        if self.hud.take().is_some() && self.load_error.is_none() {
            return Some(ViewerAction::Redraw);
        }
        None
    }

    fn start_editing(&mut self, control: Control) {
        if !self.state.is_loaded() {
            return;
        }
        match control {
            Control::PageField => {
                self.zoom_field.cancel();
                self.page_field.start();
            }
            Control::ZoomField => {
                self.page_field.cancel();
                self.zoom_field.start();
            }
            _ => {}
        }
    }

    fn handle_field_key(&mut self, key: KeyEvent) -> Option<ViewerAction> {
        let field = if self.page_field.is_editing() {
            &mut self.page_field
        } else {
            &mut self.zoom_field
        };

        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                field.push(c);
            }
            KeyCode::Backspace => field.backspace(),
            KeyCode::Esc => field.cancel(),
            KeyCode::Enter => self.commit_fields(),
            _ => {}
        }
        Some(ViewerAction::Redraw)
    }

    fn commit_fields(&mut self) {
        if let Some(page) = self.page_field.commit() {
            self.apply_command(Command::GoToPage(page));
        }
        if let Some(percent) = self.zoom_field.commit() {
            self.apply_command(Command::SetScale(percent as f32 / 100.0));
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Option<ViewerAction> {
        if self.load_error.is_some() {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => self.handle_mouse_scroll(mouse, ScrollDirection::Down),
            MouseEventKind::ScrollUp => self.handle_mouse_scroll(mouse, ScrollDirection::Up),
            MouseEventKind::Down(button) => self.handle_mouse_down(mouse, button),
            MouseEventKind::Drag(MouseButton::Left) => self.handle_mouse_drag(mouse),
            MouseEventKind::Up(MouseButton::Left) => {
                let rect = self.gesture.pointer_up()?;
                self.commit_annotation(Some(rect));
                Some(ViewerAction::Redraw)
            }
            _ => None,
        }
    }

    /// Plain wheel pages, Ctrl+wheel zooms; over the thumbnail strip the
    /// wheel scrolls the strip
    fn handle_mouse_scroll(
        &mut self,
        mouse: MouseEvent,
        direction: ScrollDirection,
    ) -> Option<ViewerAction> {
        let down = direction == ScrollDirection::Down;

        if mouse.modifiers.contains(KeyModifiers::CONTROL) {
            let cmd = if down {
                Command::ZoomOut
            } else {
                Command::ZoomIn
            };
            self.apply_command(cmd);
        } else if self.thumbnails.contains(mouse.column, mouse.row) {
            let count = self.state.page_count.unwrap_or(0);
            let height = self
                .thumbnail_area
                .map(|a| a.height)
                .unwrap_or(CELL_HEIGHT);
            self.thumbnails
                .scroll(if down { 1 } else { -1 }, count, height);
        } else {
            let cmd = if down {
                Command::NextPage
            } else {
                Command::PrevPage
            };
            self.apply_command(cmd);
        }
        Some(ViewerAction::Redraw)
    }

    fn handle_mouse_down(&mut self, mouse: MouseEvent, button: MouseButton) -> Option<ViewerAction> {
        if button == MouseButton::Left {
            if let Some(control) = self.hit_map.hit(mouse.column, mouse.row) {
                self.activate(control);
                return Some(ViewerAction::Redraw);
            }
            if let Some(page) = self.thumbnails.hit(mouse.column, mouse.row) {
                self.apply_command(Command::GoToPage(page));
                return Some(ViewerAction::Redraw);
            }
        }

        let layout = self.canvas_layout?;
        let point = layout.cell_to_surface(mouse.column, mouse.row)?;
        let context = self.gesture_context()?;
        let button = match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            MouseButton::Middle => PointerButton::Middle,
        };
        let modifier_held = self.settings.draw_modifier.is_held(mouse.modifiers);

        if self
            .gesture
            .pointer_down(point, button, modifier_held, self.draw_mode, context)
        {
            debug!("Started rectangle at ({}, {})", point.x, point.y);
            self.recomposite();
            return Some(ViewerAction::Redraw);
        }
        None
    }

    fn handle_mouse_drag(&mut self, mouse: MouseEvent) -> Option<ViewerAction> {
        if !self.gesture.is_drawing() {
            return None;
        }

        // Terminals report modifiers with every mouse event; a drag without
        // the modifier means it was let go mid-gesture.
        if !self.settings.draw_modifier.is_held(mouse.modifiers) {
            if let Some(rect) = self.gesture.modifier_released() {
                self.commit_annotation(Some(rect));
                return Some(ViewerAction::Redraw);
            }
        }

        let layout = self.canvas_layout?;
        let point = layout.cell_to_surface_clamped(mouse.column, mouse.row);
        if self.gesture.pointer_move(point) {
            self.recomposite();
            return Some(ViewerAction::Redraw);
        }
        None
    }

    fn activate(&mut self, control: Control) {
        debug!("Activated {control:?}");
        match control {
            Control::ZoomOut => self.apply_command(Command::ZoomOut),
            Control::ZoomIn => self.apply_command(Command::ZoomIn),
            Control::ZoomField | Control::PageField => self.start_editing(control),
            Control::Print => self.print(),
            Control::Download => self.download(),
            Control::Thumbnails => self.apply_command(Command::ToggleThumbnails),
            Control::DrawMode => self.toggle_draw_mode(),
            Control::Previous => self.apply_command(Command::PrevPage),
            Control::Next => self.apply_command(Command::NextPage),
        }
    }
}

// Export modules for use in tests
pub mod actions;
pub mod annotations;
pub mod error;
pub mod event_source;
pub mod main_app;
pub mod panic_handler;
pub mod pdf;
pub mod settings;
pub mod system_command;
pub mod theme;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use main_app::{App, AppAction, run_app_with_event_source};

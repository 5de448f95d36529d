use std::io::{self, Write};
use std::panic;

use crossterm::{
    cursor::Show,
    event::{DisableMouseCapture, PopKeyboardEnhancementFlags},
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};

/// Install the panic hook: the terminal is handed back before the report is
/// printed, so the report is readable and the shell is usable afterwards.
///
/// Debug builds get better-panic backtraces, release builds the human-panic
/// crash report.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();
    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!();

    let report = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        log::error!("pdfpeek panicked: {info}");
        report(info);
        std::process::exit(1);
    }));
}

/// Leave raw mode and the alternate screen, stop mouse capture and key
/// release reporting, and show the cursor again. Errors are ignored: this
/// runs on the way out.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let mut out = io::stdout();
    let _ = execute!(out, PopKeyboardEnhancementFlags);
    let _ = execute!(out, DisableMouseCapture, LeaveAlternateScreen);
    let mut err = io::stderr();
    let _ = execute!(err, Show);
    let _ = writeln!(err);
}

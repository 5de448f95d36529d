use std::fs::File;
use std::io::{Read, stdout};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use log::{error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfpeek::annotations::{JsonFileStore, KeyValueStore, MemoryStore};
use pdfpeek::event_source::KeyboardEventSource;
use pdfpeek::panic_handler;
use pdfpeek::pdf::{DocumentSource, MupdfBackend};
use pdfpeek::settings::{self, default_storage_path, get_settings};
use pdfpeek::system_command::RealSystemCommandExecutor;
use pdfpeek::widget::pdf_viewer::{PdfViewer, ViewerOptions};
use pdfpeek::{App, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "pdfpeek", version, about = "View and annotate PDF files in the terminal")]
struct Args {
    /// PDF file to open, or `-` to read it from stdin
    file: String,

    /// Page to open at (1-based)
    #[arg(short, long)]
    page: Option<usize>,

    /// Initial zoom in percent
    #[arg(short, long)]
    zoom: Option<u32>,

    /// Show the thumbnail strip on start
    #[arg(short, long)]
    thumbnails: bool,

    /// Config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Annotation storage file instead of the default location
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Keep annotations in memory only
    #[arg(long)]
    no_persist: bool,

    #[arg(long, default_value = "pdfpeek.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("creating log file {}", args.log_file.display()))?,
    )?;

    panic_handler::initialize_panic_handler();

    info!("Starting pdfpeek");

    settings::load_settings(args.config.as_deref());
    let settings = get_settings();

    let source = if args.file == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("reading document from stdin")?;
        DocumentSource::from_bytes("stdin.pdf", data)
    } else {
        DocumentSource::from_path(&args.file)
    };

    let store = open_store(&args);
    let options = ViewerOptions {
        initial_page: args.page,
        initial_scale: args.zoom.map(|pct| pct as f32 / 100.0),
        show_thumbnails: args.thumbnails,
    };
    let viewer = PdfViewer::new(
        source,
        Arc::new(MupdfBackend),
        store,
        settings,
        Box::new(RealSystemCommandExecutor),
        options,
    );
    let mut app = App::new(viewer);

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    // Key releases let a drawing end when its modifier is let go
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
            )
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut events);

    // Restore terminal
    if enhanced {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pdfpeek");
    Ok(())
}

fn open_store(args: &Args) -> Box<dyn KeyValueStore> {
    if args.no_persist {
        info!("Annotations kept in memory only");
        return Box::new(MemoryStore::new());
    }

    let Some(path) = args.storage.clone().or_else(default_storage_path) else {
        warn!("No data directory, annotations kept in memory only");
        return Box::new(MemoryStore::new());
    };
    match JsonFileStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("Annotation storage {} unavailable: {e}", path.display());
            Box::new(MemoryStore::new())
        }
    }
}

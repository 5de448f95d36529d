//! Print, download and open-externally actions

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::TempPath;

use crate::error::ViewerError;
use crate::pdf::{DocumentSource, Surface};
use crate::settings::{PrintMode, Settings};
use crate::system_command::SystemCommandExecutor;

/// A file handed to an external program.
///
/// Temporary files are removed when this is dropped, so the caller keeps it
/// around while the external program may still be reading it.
#[derive(Debug)]
pub struct HandedOff {
    pub path: PathBuf,
    temp: Option<TempPath>,
}

impl HandedOff {
    fn existing(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            temp: None,
        }
    }

    fn temporary(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Send the document, or the visible canvas, to the print spooler
pub fn print_document(
    source: &DocumentSource,
    canvas: Option<&Surface>,
    settings: &Settings,
    executor: &dyn SystemCommandExecutor,
) -> Result<HandedOff, ViewerError> {
    let file = match settings.print_mode {
        PrintMode::Document => materialize(source, ViewerError::print)?,
        PrintMode::Snapshot => {
            let canvas = canvas.ok_or_else(|| ViewerError::print("nothing rendered yet"))?;
            let temp = tempfile::Builder::new()
                .prefix("pdfpeek-")
                .suffix(".png")
                .tempfile()
                .map_err(ViewerError::print)?
                .into_temp_path();
            canvas.save_png(&temp)?;
            HandedOff::temporary(temp)
        }
    };

    let mut parts = settings.print_command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ViewerError::print("no print command configured"))?;
    let mut args: Vec<String> = parts.map(str::to_string).collect();
    args.push(file.path.to_string_lossy().into_owned());

    executor.run(program, &args).map_err(ViewerError::print)?;
    info!(
        "Sent {} to {program} ({} mode)",
        source.display_name(),
        settings.print_mode.as_str()
    );
    Ok(file)
}

/// Save a copy of the original document bytes into the download directory.
///
/// Never overwrites: `document.pdf` becomes `document (1).pdf` and so on.
pub fn download_document(source: &DocumentSource, settings: &Settings) -> Result<PathBuf, ViewerError> {
    let bytes = source
        .read_bytes()
        .map_err(|e| ViewerError::download(e.to_string()))?;
    let dir = settings.resolved_download_dir();
    fs::create_dir_all(&dir)
        .map_err(|e| ViewerError::download(format!("cannot create {dir:?}: {e}")))?;

    let (file, path) = create_unique(&dir, &settings.download_file_name)?;
    write_or_remove(file, &path, &bytes)?;

    info!("Downloaded {} to {path:?}", source.display_name());
    Ok(path)
}

/// Open the document in the system's default viewer
pub fn open_externally(
    source: &DocumentSource,
    executor: &dyn SystemCommandExecutor,
) -> Result<HandedOff, ViewerError> {
    let file = materialize(source, ViewerError::open)?;
    executor.open_file(&file.path).map_err(ViewerError::open)?;
    Ok(file)
}

/// Candidate names for a download: `name`, `stem (1).ext`, `stem (2).ext`...
pub fn numbered_file_name(name: &str, n: usize) -> String {
    if n == 0 {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    }
}

/// Write the whole download, removing the file again if that fails
fn write_or_remove<W: Write>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), ViewerError> {
    let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) else {
        return Ok(());
    };
    drop(file);
    if let Err(rm) = fs::remove_file(path) {
        warn!("Could not remove partial download {path:?}: {rm}");
    }
    Err(ViewerError::download(format!("cannot write {path:?}: {e}")))
}

fn create_unique(dir: &Path, name: &str) -> Result<(fs::File, PathBuf), ViewerError> {
    const MAX_ATTEMPTS: usize = 10_000;

    for n in 0..MAX_ATTEMPTS {
        let path = dir.join(numbered_file_name(name, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ViewerError::download(format!("cannot create {path:?}: {e}")));
            }
        }
    }
    Err(ViewerError::download(format!(
        "too many copies of {name} in {dir:?}"
    )))
}

/// A path an external program can read; byte sources are written to a
/// temporary file first.
fn materialize(
    source: &DocumentSource,
    to_error: fn(String) -> ViewerError,
) -> Result<HandedOff, ViewerError> {
    if let Some(path) = source.path() {
        return Ok(HandedOff::existing(path));
    }

    let bytes = source.read_bytes().map_err(|e| to_error(e.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("pdfpeek-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| to_error(e.to_string()))?;
    if let Err(e) = temp.write_all(&bytes) {
        warn!("Could not write temporary copy of {}", source.display_name());
        return Err(to_error(e.to_string()));
    }
    Ok(HandedOff::temporary(temp.into_temp_path()))
}

use crossterm::event::{KeyModifiers, ModifierKeyCode};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::annotations::{format_color, parse_color};
use crate::pdf::{DEFAULT_CACHE_SIZE, DEFAULT_WORKERS, RenderConfig, ZoomLimits};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const STORAGE_FILENAME: &str = "storage.json";
const APP_NAME: &str = "pdfpeek";

/// Modifier key that turns a mouse drag into a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrawModifier {
    #[default]
    Ctrl,
    Alt,
    Shift,
}

impl DrawModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawModifier::Ctrl => "ctrl",
            DrawModifier::Alt => "alt",
            DrawModifier::Shift => "shift",
        }
    }

    pub fn key_modifiers(&self) -> KeyModifiers {
        match self {
            DrawModifier::Ctrl => KeyModifiers::CONTROL,
            DrawModifier::Alt => KeyModifiers::ALT,
            DrawModifier::Shift => KeyModifiers::SHIFT,
        }
    }

    pub fn is_held(&self, modifiers: KeyModifiers) -> bool {
        modifiers.contains(self.key_modifiers())
    }

    /// True if a modifier key event is for this modifier, either side
    pub fn matches_key(&self, code: ModifierKeyCode) -> bool {
        use ModifierKeyCode::*;
        matches!(
            (self, code),
            (DrawModifier::Ctrl, LeftControl | RightControl)
                | (DrawModifier::Alt, LeftAlt | RightAlt)
                | (DrawModifier::Shift, LeftShift | RightShift)
        )
    }
}

/// What the print action sends to the spooler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrintMode {
    /// The original document file
    #[default]
    Document,
    /// The visible canvas, annotations included, as a PNG
    Snapshot,
}

impl PrintMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintMode::Document => "document",
            PrintMode::Snapshot => "snapshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_min_scale")]
    pub min_scale: f32,

    #[serde(default = "default_max_scale")]
    pub max_scale: f32,

    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,

    #[serde(default = "default_scale")]
    pub default_scale: f32,

    #[serde(default = "default_thumbnail_scale")]
    pub thumbnail_scale: f32,

    #[serde(default)]
    pub draw_modifier: DrawModifier,

    #[serde(default = "default_annotation_color")]
    pub annotation_color: String,

    #[serde(default)]
    pub print_mode: PrintMode,

    #[serde(default = "default_print_command")]
    pub print_command: String,

    /// Falls back to the user's download directory, then the current one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    #[serde(default = "default_download_file_name")]
    pub download_file_name: String,

    #[serde(default = "default_render_workers")]
    pub render_workers: usize,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_min_scale() -> f32 {
    0.5
}

fn default_max_scale() -> f32 {
    2.0
}

fn default_zoom_step() -> f32 {
    0.1
}

fn default_scale() -> f32 {
    1.0
}

fn default_thumbnail_scale() -> f32 {
    0.2
}

fn default_annotation_color() -> String {
    "#ff0000".to_string()
}

fn default_print_command() -> String {
    "lp".to_string()
}

fn default_download_file_name() -> String {
    "document.pdf".to_string()
}

fn default_render_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            zoom_step: default_zoom_step(),
            default_scale: default_scale(),
            thumbnail_scale: default_thumbnail_scale(),
            draw_modifier: DrawModifier::default(),
            annotation_color: default_annotation_color(),
            print_mode: PrintMode::default(),
            print_command: default_print_command(),
            download_dir: None,
            download_file_name: default_download_file_name(),
            render_workers: default_render_workers(),
            cache_size: default_cache_size(),
        }
    }
}

impl Settings {
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_scale,
            max: self.max_scale,
            step: self.zoom_step,
            default: self.default_scale,
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            workers: self.render_workers,
            cache_size: self.cache_size,
        }
    }

    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Fix values that would break zooming, rendering or saving.
    ///
    /// Returns one message per repaired field.
    pub fn repair(&mut self) -> Vec<String> {
        let mut repaired = Vec::new();

        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !positive(self.min_scale) {
            repaired.push(format!("min_scale {} reset to {}", self.min_scale, default_min_scale()));
            self.min_scale = default_min_scale();
        }
        if !positive(self.max_scale) {
            repaired.push(format!("max_scale {} reset to {}", self.max_scale, default_max_scale()));
            self.max_scale = default_max_scale();
        }
        if self.min_scale > self.max_scale {
            repaired.push(format!(
                "min_scale {} above max_scale {}, swapped",
                self.min_scale, self.max_scale
            ));
            std::mem::swap(&mut self.min_scale, &mut self.max_scale);
        }
        if !positive(self.zoom_step) {
            repaired.push(format!("zoom_step {} reset to {}", self.zoom_step, default_zoom_step()));
            self.zoom_step = default_zoom_step();
        }
        if !self.default_scale.is_finite() {
            repaired.push(format!("default_scale {} reset", self.default_scale));
            self.default_scale = default_scale();
        }
        let clamped = self.default_scale.clamp(self.min_scale, self.max_scale);
        if clamped != self.default_scale {
            repaired.push(format!(
                "default_scale {} clamped to {clamped}",
                self.default_scale
            ));
            self.default_scale = clamped;
        }
        if !positive(self.thumbnail_scale) {
            repaired.push(format!(
                "thumbnail_scale {} reset to {}",
                self.thumbnail_scale,
                default_thumbnail_scale()
            ));
            self.thumbnail_scale = default_thumbnail_scale();
        }

        match parse_color(&self.annotation_color) {
            Some(rgb) => self.annotation_color = format_color(rgb),
            None => {
                repaired.push(format!(
                    "annotation_color {:?} is not a color",
                    self.annotation_color
                ));
                self.annotation_color = default_annotation_color();
            }
        }

        if self.print_command.trim().is_empty() {
            repaired.push("print_command is empty".to_string());
            self.print_command = default_print_command();
        }
        if self.download_file_name.trim().is_empty() {
            repaired.push("download_file_name is empty".to_string());
            self.download_file_name = default_download_file_name();
        }
        if self.render_workers == 0 {
            repaired.push("render_workers must be at least 1".to_string());
            self.render_workers = 1;
        }
        if self.cache_size == 0 {
            repaired.push("cache_size must be at least 1".to_string());
            self.cache_size = default_cache_size();
        }

        repaired
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Default location of the annotation storage file
pub fn default_storage_path() -> Option<PathBuf> {
    dirs::data_dir().map(|data| data.join(APP_NAME).join(STORAGE_FILENAME))
}

/// Parse, migrate and repair settings from YAML text
pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    let mut settings = if content.trim().is_empty() {
        Settings::default()
    } else {
        serde_yaml::from_str::<Settings>(content)?
    };

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
    }
    for message in settings.repair() {
        warn!("Invalid setting repaired: {message}");
    }
    Ok(settings)
}

/// Load settings into the process-wide store.
///
/// `path` overrides the default config location. A missing file is created
/// with defaults; an unreadable one is logged and defaults are kept.
pub fn load_settings(path: Option<&Path>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match preferred_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return;
            }
        },
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Zoom bounds, step and starting zoom (1.0 = 100%)\n");
    content.push_str(&format!("min_scale: {}\n", settings.min_scale));
    content.push_str(&format!("max_scale: {}\n", settings.max_scale));
    content.push_str(&format!("zoom_step: {}\n", settings.zoom_step));
    content.push_str(&format!("default_scale: {}\n", settings.default_scale));
    content.push_str(&format!("thumbnail_scale: {}\n", settings.thumbnail_scale));
    content.push('\n');
    content.push_str("# Hold this key while dragging to draw a rectangle: ctrl, alt or shift\n");
    content.push_str(&format!(
        "draw_modifier: {}\n",
        settings.draw_modifier.as_str()
    ));
    content.push_str(&format!(
        "annotation_color: {}\n",
        yaml_string(&settings.annotation_color)
    ));
    content.push('\n');
    content.push_str("# document prints the original file, snapshot prints the visible page\n");
    content.push_str(&format!("print_mode: {}\n", settings.print_mode.as_str()));
    content.push_str(&format!(
        "print_command: {}\n",
        yaml_string(&settings.print_command)
    ));
    match &settings.download_dir {
        Some(dir) => content.push_str(&format!(
            "download_dir: {}\n",
            yaml_string(&dir.to_string_lossy())
        )),
        None => content.push_str("# download_dir: \"/path/to/downloads\"\n"),
    }
    content.push_str(&format!(
        "download_file_name: {}\n",
        yaml_string(&settings.download_file_name)
    ));
    content.push('\n');
    content.push_str(&format!("render_workers: {}\n", settings.render_workers));
    content.push_str(&format!("cache_size: {}\n", settings.cache_size));

    content
}

/// A string as a YAML scalar, quoted and escaped where needed
fn yaml_string(value: &str) -> String {
    match serde_yaml::to_string(value) {
        Ok(encoded) => encoded.trim_end().to_string(),
        Err(_) => format!("{value:?}"),
    }
}

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_settings("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = parse_settings("max_scale: 3.0\nprint_mode: snapshot\n").unwrap();
        assert_eq!(settings.max_scale, 3.0);
        assert_eq!(settings.print_mode, PrintMode::Snapshot);
        assert_eq!(settings.min_scale, 0.5);
        assert_eq!(settings.print_command, "lp");
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let settings = parse_settings("min_scale: 4.0\nmax_scale: 1.0\n").unwrap();
        assert_eq!((settings.min_scale, settings.max_scale), (1.0, 4.0));
    }

    #[test]
    fn invalid_values_are_repaired() {
        let yaml = "zoom_step: -1\ndefault_scale: 9\nannotation_color: \"mauve-ish\"\nrender_workers: 0\n";
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(settings.zoom_step, 0.1);
        assert_eq!(settings.default_scale, 2.0);
        assert_eq!(settings.annotation_color, "#ff0000");
        assert_eq!(settings.render_workers, 1);
    }

    #[test]
    fn colors_are_normalised() {
        let settings = parse_settings("annotation_color: \"#0F0\"\n").unwrap();
        assert_eq!(settings.annotation_color, "#00ff00");
    }

    #[test]
    fn generated_yaml_parses_back() {
        let mut settings = Settings::default();
        settings.draw_modifier = DrawModifier::Alt;
        settings.download_dir = Some(PathBuf::from("/tmp/pdfs"));
        let yaml = generate_settings_yaml(&settings);
        assert_eq!(parse_settings(&yaml).unwrap(), settings);
    }

    #[test]
    fn quotes_and_backslashes_survive_saving() {
        let settings = Settings {
            print_command: r#"lp -o "media=A4" -d office\printer"#.to_string(),
            download_dir: Some(PathBuf::from(r#"C:\Users\me\"odd" dir"#)),
            download_file_name: "yes".to_string(),
            ..Settings::default()
        };
        let yaml = generate_settings_yaml(&settings);
        assert_eq!(parse_settings(&yaml).unwrap(), settings);
    }

    #[test]
    fn draw_modifier_matches_key_modifiers() {
        assert!(DrawModifier::Ctrl.is_held(KeyModifiers::CONTROL | KeyModifiers::SHIFT));
        assert!(!DrawModifier::Alt.is_held(KeyModifiers::CONTROL));
        assert!(DrawModifier::Ctrl.matches_key(ModifierKeyCode::RightControl));
        assert!(!DrawModifier::Shift.matches_key(ModifierKeyCode::LeftAlt));
    }

    #[test]
    #[serial]
    fn load_creates_missing_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.yaml");
        set_settings(Settings::default());

        load_settings(Some(&path));
        assert!(path.exists());
        assert_eq!(get_settings(), Settings::default());
    }

    #[test]
    #[serial]
    fn load_replaces_global_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "draw_modifier: shift\nmin_scale: 0.25\n").unwrap();

        load_settings(Some(&path));
        let loaded = get_settings();
        assert_eq!(loaded.draw_modifier, DrawModifier::Shift);
        assert_eq!(loaded.zoom_limits().min, 0.25);

        set_settings(Settings::default());
    }
}

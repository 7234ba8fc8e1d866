//! Persisted user settings.
//!
//! Settings live in an INI file at `<config dir>/segfetch/config.ini`:
//!
//! ```ini
//! [download]
//! segments = 4
//! directory = /home/user/Downloads
//!
//! [filter]
//! extensions = zip, iso, tar, gz
//! ```
//!
//! A missing file yields the defaults. Unknown keys are ignored.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::filter::ExtensionFilter;

/// Default number of concurrent segments.
pub const DEFAULT_SEGMENTS: usize = 4;

/// Extensions allowed out of the box.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "zip", "tar", "gz", "xz", "7z", "iso", "img", "bin", "pdf", "mp3", "mp4", "mkv", "deb", "rpm",
    "dmg", "exe", "msi",
];

const SECTION_DOWNLOAD: &str = "download";
const SECTION_FILTER: &str = "filter";
const KEY_SEGMENTS: &str = "segments";
const KEY_DIRECTORY: &str = "directory";
const KEY_EXTENSIONS: &str = "extensions";

/// Errors from loading, saving or editing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown setting '{0}'")]
    UnknownKey(String),
}

/// Directory holding segfetch's configuration.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("segfetch")
}

/// Path of the settings file.
pub fn settings_file_path() -> PathBuf {
    config_dir().join("config.ini")
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// User settings consulted before a download starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Segments per download.
    pub segments: usize,
    /// Where downloads are saved when no output path is given.
    pub download_dir: PathBuf,
    /// Allowed file extensions, lowercase without dots. Empty allows all.
    pub allowed_extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            download_dir: default_download_dir(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Load from the default settings file.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(settings_file_path())
    }

    /// Load from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let ini = Ini::load_from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        for key in SettingKey::all() {
            if let Some(value) = ini
                .section(Some(key.section()))
                .and_then(|s| s.get(key.key_name()))
            {
                key.set(&mut settings, value)?;
            }
        }

        Ok(settings)
    }

    /// Save to the default settings file, creating its directory.
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(settings_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut ini = Ini::new();
        for key in SettingKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        ini.write_to_file(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Extension filter built from the allow-list.
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.allowed_extensions)
    }
}

/// A single editable setting, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    DownloadSegments,
    DownloadDirectory,
    FilterExtensions,
}

impl SettingKey {
    /// Every key, in file order.
    pub fn all() -> &'static [SettingKey] {
        &[
            SettingKey::DownloadSegments,
            SettingKey::DownloadDirectory,
            SettingKey::FilterExtensions,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            SettingKey::DownloadSegments | SettingKey::DownloadDirectory => SECTION_DOWNLOAD,
            SettingKey::FilterExtensions => SECTION_FILTER,
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            SettingKey::DownloadSegments => KEY_SEGMENTS,
            SettingKey::DownloadDirectory => KEY_DIRECTORY,
            SettingKey::FilterExtensions => KEY_EXTENSIONS,
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value rendered as a string.
    pub fn get(&self, settings: &Settings) -> String {
        match self {
            SettingKey::DownloadSegments => settings.segments.to_string(),
            SettingKey::DownloadDirectory => settings.download_dir.display().to_string(),
            SettingKey::FilterExtensions => settings.allowed_extensions.join(", "),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, settings: &mut Settings, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        match self {
            SettingKey::DownloadSegments => {
                let segments: usize = value
                    .parse()
                    .map_err(|_| self.invalid(value, "not a number"))?;
                if segments == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                settings.segments = segments;
            }
            SettingKey::DownloadDirectory => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                settings.download_dir = PathBuf::from(value);
            }
            SettingKey::FilterExtensions => {
                settings.allowed_extensions = parse_extension_list(value);
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> SettingsError {
        SettingsError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

/// Split a comma-separated extension list into normalized entries.
pub fn parse_extension_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

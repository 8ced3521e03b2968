//! Application settings types and persistence
//!
//! Settings live in `settings.json` inside the per-user app data folder.
//! Every field has a serde default so older or hand-edited files keep loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::registry::{JsonSourceRegistry, SourceRegistry, SqliteSourceRegistry};

/// App data folder name.
const APP_DATA_FOLDER: &str = "SheetRefs";
/// Settings file name inside the app data folder.
const SETTINGS_FILE: &str = "settings.json";
/// Default JSON registry file name.
const JSON_REGISTRY_FILE: &str = "source_refs.json";
/// Default SQLite registry file name.
const SQLITE_REGISTRY_FILE: &str = "source_refs.db";

/// A directory from an environment variable; unset, empty or relative values
/// are ignored.
fn env_dir(name: &str) -> Option<PathBuf> {
    dir_from_value(std::env::var_os(name))
}

fn dir_from_value(value: Option<std::ffi::OsString>) -> Option<PathBuf> {
    let path = PathBuf::from(value?);
    if path.as_os_str().is_empty() || !path.is_absolute() {
        return None;
    }
    Some(path)
}

/// Get the app data directory for settings and the source registry.
/// Uses LocalAppData on Windows.
pub fn get_data_dir() -> Result<PathBuf, String> {
    #[cfg(target_os = "windows")]
    {
        if let Some(local_app_data) = env_dir("LOCALAPPDATA") {
            return Ok(local_app_data.join(APP_DATA_FOLDER));
        }

        if let Some(user_profile) = env_dir("USERPROFILE") {
            return Ok(user_profile
                .join("AppData")
                .join("Local")
                .join(APP_DATA_FOLDER));
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = env_dir("HOME") {
            return Ok(home
                .join("Library")
                .join("Application Support")
                .join(APP_DATA_FOLDER));
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(data_home) = env_dir("XDG_DATA_HOME") {
            return Ok(data_home.join(APP_DATA_FOLDER));
        } else if let Some(home) = env_dir("HOME") {
            return Ok(home
                .join(".local")
                .join("share")
                .join(APP_DATA_FOLDER));
        }
    }

    std::env::current_dir()
        .map(|d| d.join(APP_DATA_FOLDER))
        .map_err(|e| format!("Failed to resolve an app data directory: {}", e))
}

/// Which store backs the source registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RegistryBackendSetting {
    #[serde(rename = "json")]
    #[default]
    Json,
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl RegistryBackendSetting {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }

    fn default_file_name(&self) -> &'static str {
        match self {
            Self::Json => JSON_REGISTRY_FILE,
            Self::Sqlite => SQLITE_REGISTRY_FILE,
        }
    }
}

/// File type filter shown in the locate-source dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilterSetting {
    #[serde(default = "default_filter_name")]
    pub name: String,
    #[serde(default = "default_filter_extensions")]
    pub extensions: Vec<String>,
}

fn default_filter_name() -> String {
    "PDF".to_string()
}

fn default_filter_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

impl Default for FileFilterSetting {
    fn default() -> Self {
        Self {
            name: default_filter_name(),
            extensions: default_filter_extensions(),
        }
    }
}

impl FileFilterSetting {
    /// Whether `path` has one of the filter's extensions (case-insensitive).
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext))
    }
}

// Platform openers take no page argument; set `viewer_command` to a
// page-capable viewer (e.g. `okular --unique -p {page} {path}`) to land on the page.
fn default_viewer_command() -> Vec<String> {
    #[cfg(target_os = "windows")]
    let argv = ["cmd", "/C", "start", "", "{path}"];
    #[cfg(target_os = "macos")]
    let argv = ["open", "{path}"];
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let argv = ["xdg-open", "{path}"];

    argv.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

/// Persistent settings for page reference resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default)]
    pub registry_backend: RegistryBackendSetting,

    /// Registry location; defaults to a file in the app data folder.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,

    /// Treat registered files that have disappeared as unregistered.
    #[serde(default = "default_true")]
    pub require_existing_files: bool,

    #[serde(default)]
    pub file_filter: FileFilterSetting,

    /// External viewer argv. `{path}`, `{page}` and `{highlight}` are substituted.
    #[serde(default = "default_viewer_command")]
    pub viewer_command: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            registry_backend: RegistryBackendSetting::default(),
            registry_path: None,
            require_existing_files: true,
            file_filter: FileFilterSetting::default(),
            viewer_command: default_viewer_command(),
        }
    }
}

impl ResolverSettings {
    /// Default location of `settings.json`.
    pub fn default_path() -> Result<PathBuf, String> {
        Ok(get_data_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings {:?}: {}", path, e))?;
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse settings {:?}: {}", path, e))
    }

    /// Save settings to `path`, creating parent folders as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create settings directory {:?}: {}", parent, e)
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write settings {:?}: {}", path, e))
    }

    /// The registry file this configuration points at.
    pub fn resolved_registry_path(&self) -> Result<PathBuf, String> {
        match &self.registry_path {
            Some(p) => Ok(p.clone()),
            None => Ok(get_data_dir()?.join(self.registry_backend.default_file_name())),
        }
    }

    /// Open the configured source registry.
    pub fn open_registry(&self) -> Result<Box<dyn SourceRegistry>, String> {
        let path = self.resolved_registry_path()?;
        info!(
            "Opening {} source registry at {:?}",
            self.registry_backend.label(),
            path
        );
        match self.registry_backend {
            RegistryBackendSetting::Json => Ok(Box::new(JsonSourceRegistry::open(path)?)),
            RegistryBackendSetting::Sqlite => Ok(Box::new(SqliteSourceRegistry::open(&path)?)),
        }
    }
}

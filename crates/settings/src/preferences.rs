use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const PREFERENCES_VERSION: u32 = 1;

/// File name of the preferences document inside the configuration directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub site: SitePreferences,
    #[serde(default)]
    pub preview: PreviewPreferences,
    #[serde(default)]
    pub capture: CapturePreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            site: SitePreferences::default(),
            preview: PreviewPreferences::default(),
            capture: CapturePreferences::default(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.site.sanitize();
        self.preview.sanitize();
    }
}

/// 網站文件相關設定。 / Settings describing authored documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePreferences {
    /// Extension (without dot) of documents the commands act on.
    #[serde(default = "default_document_extension")]
    pub document_extension: String,
}

fn default_document_extension() -> String {
    "md".to_string()
}

impl Default for SitePreferences {
    fn default() -> Self {
        Self {
            document_extension: default_document_extension(),
        }
    }
}

impl SitePreferences {
    fn sanitize(&mut self) {
        let trimmed = self.document_extension.trim().trim_start_matches('.');
        self.document_extension = if trimmed.is_empty() {
            default_document_extension()
        } else {
            trimmed.to_string()
        };
    }
}

/// 預覽相關設定。 / Live preview settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewPreferences {
    /// Command line sent to the preview shell after it changes into the site root.
    #[serde(default = "default_serve_command")]
    pub serve_command: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Where the preview page is written; defaults to a file in the temp dir.
    #[serde(default)]
    pub surface_path: Option<PathBuf>,
    /// Whether the previewed site may run scripts.
    #[serde(default = "default_enable_scripts")]
    pub enable_scripts: bool,
}

fn default_enable_scripts() -> bool {
    true
}

fn default_serve_command() -> String {
    "zola serve".to_string()
}

fn default_poll_interval() -> u64 {
    500
}

impl Default for PreviewPreferences {
    fn default() -> Self {
        Self {
            serve_command: default_serve_command(),
            poll_interval_ms: default_poll_interval(),
            surface_path: None,
            enable_scripts: default_enable_scripts(),
        }
    }
}

impl PreviewPreferences {
    fn sanitize(&mut self) {
        if self.serve_command.trim().is_empty() {
            self.serve_command = default_serve_command();
        }
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = default_poll_interval();
        }
        self.poll_interval_ms = self.poll_interval_ms.clamp(50, 60_000);
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 圖片擷取相關設定。 / Clipboard image capture settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CapturePreferences {
    /// Directory the bundled helper scripts are written to.
    #[serde(default)]
    pub script_dir: Option<PathBuf>,
    /// Windows-side user directory (as seen from WSL, e.g. `/mnt/c/Users/me`).
    #[serde(default)]
    pub windows_user_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            log::debug!("no preferences at {}, using defaults", path.display());
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

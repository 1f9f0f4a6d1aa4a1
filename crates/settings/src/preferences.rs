use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PREFERENCES_VERSION: u32 = 1;
const DEFAULT_FONT: &str = "Courier";
const DEFAULT_FONT_SIZE: f32 = 10.0;
const MAX_FONT_SIZE: f32 = 144.0;

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

/// 命令列未指定時所套用的預設值。 / Defaults applied when the command line leaves a setting out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub printer: PrinterPreferences,
    #[serde(default)]
    pub text: TextPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            printer: PrinterPreferences::default(),
            text: TextPreferences::default(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.printer.sanitize();
        self.text.sanitize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterPreferences {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub paper_size: Option<String>,
    #[serde(default)]
    pub landscape: bool,
    #[serde(default)]
    pub margins: MarginPreferences,
}

impl PrinterPreferences {
    fn sanitize(&mut self) {
        clear_blank(&mut self.name);
        clear_blank(&mut self.paper_size);
        self.margins.sanitize();
    }
}

/// 以百分之一英吋表示的邊界；`None` 保留驅動程式預設值。 / Margins in hundredths of an inch; `None` keeps the driver default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginPreferences {
    #[serde(default)]
    pub top: Option<i32>,
    #[serde(default)]
    pub bottom: Option<i32>,
    #[serde(default)]
    pub left: Option<i32>,
    #[serde(default)]
    pub right: Option<i32>,
}

impl MarginPreferences {
    fn sanitize(&mut self) {
        for edge in [&mut self.top, &mut self.bottom, &mut self.left, &mut self.right] {
            if edge.is_some_and(|value| value < 0) {
                *edge = None;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPreferences {
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_true")]
    pub wrap: bool,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub page_numbers: bool,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for TextPreferences {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            wrap: true,
            header: None,
            footer: None,
            page_numbers: false,
        }
    }
}

impl TextPreferences {
    fn sanitize(&mut self) {
        if self.font.trim().is_empty() {
            self.font = default_font();
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            self.font_size = default_font_size();
        }
        self.font_size = self.font_size.min(MAX_FONT_SIZE);
        clear_blank(&mut self.header);
        clear_blank(&mut self.footer);
    }
}

fn clear_blank(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|text| text.trim().is_empty()) {
        *value = None;
    }
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
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let data = read_preferences(&path)?;
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.data
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
        ensure_parent(&self.path)?;
        let payload = serialize(&self.data, &self.path)?;

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

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;
        let payload = serialize(&self.data, &path)?;
        fs::write(&path, payload.as_bytes())
            .map_err(|source| PreferencesError::Write { path, source })
    }

    /// 以 `source` 取代儲存的偏好設定，並保留舊檔為 `.bak`。 / Replaces the stored preferences with `source`, keeping a `.bak` of the old file.
    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let data = read_preferences(source.as_ref())?;
        self.backup_existing()?;
        self.data = data;
        self.save()
    }

    fn backup_existing(&self) -> Result<(), PreferencesError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| PreferencesError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

fn read_preferences(path: &Path) -> Result<Preferences, PreferencesError> {
    let contents = fs::read_to_string(path).map_err(|source| PreferencesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data: Preferences =
        serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    data.sanitize();
    Ok(data)
}

fn serialize(data: &Preferences, path: &Path) -> Result<String, PreferencesError> {
    serde_json::to_string_pretty(data).map_err(|source| PreferencesError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<(), PreferencesError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

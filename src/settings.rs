use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, ErrorContext, Result};

pub const SETTINGS_DIR: &str = ".ppx-mcp";
pub const SETTINGS_FILE: &str = "settings.json";
pub const COOKIES_ENV: &str = "PERPLEXITY_COOKIES";

// ============================================================================
// Session cookies
// ============================================================================

/// Opaque browser session cookie string. Never parsed; redacted in `Debug`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookies(String);

impl SessionCookies {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self(cookies.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCookies(<{} bytes redacted>)", self.0.len())
    }
}

// ============================================================================
// Settings file
// ============================================================================

/// Contents of `settings.json`. Keys other than `cookies` are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.ppx-mcp/settings.json`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file. A missing file yields empty settings.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .context(format!("reading {}", self.path.display()))?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::settings(format!("invalid settings file {}: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context(format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).context(format!("writing {}", self.path.display()))?;
        Ok(())
    }

    /// Replaces the stored cookie string, keeping every other key.
    pub fn save_cookies(&self, cookies: &str) -> Result<()> {
        let mut settings = self.load()?;
        settings.cookies = Some(cookies.to_string());
        self.save(&settings)?;
        log::info!("Cookies saved to {}", self.path.display());
        Ok(())
    }

    /// Cookies from the settings file, else from `env_value`
    /// (normally `PERPLEXITY_COOKIES`), else empty.
    pub fn resolve_cookies(&self, env_value: Option<String>) -> SessionCookies {
        let stored = match self.load() {
            Ok(settings) => settings.cookies,
            Err(e) => {
                log::warn!("Ignoring settings file: {}", e);
                None
            }
        };

        if let Some(cookies) = stored.filter(|c| !c.trim().is_empty()) {
            log::debug!("Using cookies from {}", self.path.display());
            return SessionCookies::new(cookies);
        }
        match env_value.filter(|c| !c.trim().is_empty()) {
            Some(cookies) => {
                log::debug!("Using cookies from {}", COOKIES_ENV);
                SessionCookies::new(cookies)
            }
            None => SessionCookies::default(),
        }
    }
}

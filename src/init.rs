use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::PerplexityClient;
use crate::models::ModelRegistry;
use crate::request::{RequestBuilder, SearchDefaults};
use crate::settings::{COOKIES_ENV, SETTINGS_FILE, SettingsStore};
use crate::tools::ToolHost;
use crate::transport::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpTransport};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub timeout: Duration,
    pub settings_path: PathBuf,
    pub language: Option<String>,
    pub timezone: Option<String>,
    /// Cookie string from `PERPLEXITY_COOKIES`, used when the settings file has none.
    pub cookies_env: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let settings_path = match std::env::var("PPX_SETTINGS_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => SettingsStore::default_path().unwrap_or_else(|| PathBuf::from(SETTINGS_FILE)),
        };
        let timeout = match std::env::var("PPX_TIMEOUT_SECS") {
            Ok(secs) => Duration::from_secs(secs.parse()?),
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            base_url: std::env::var("PPX_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout,
            settings_path,
            language: std::env::var("PPX_LANGUAGE").ok(),
            timezone: std::env::var("PPX_TIMEZONE").ok(),
            cookies_env: std::env::var(COOKIES_ENV).ok(),
        })
    }

    pub fn search_defaults(&self) -> SearchDefaults {
        let mut defaults = SearchDefaults::default();
        if let Some(language) = &self.language {
            defaults.language = language.clone();
        }
        if let Some(timezone) = &self.timezone {
            defaults.timezone = timezone.clone();
        }
        defaults
    }
}

// ============================================================================
// Application state
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolHost>,
}

/// Wires settings, transport and request defaults into a tool host.
pub fn build_tool_host(config: &Config) -> Result<ToolHost, Box<dyn Error>> {
    let settings = SettingsStore::new(config.settings_path.clone());
    let cookies = settings.resolve_cookies(config.cookies_env.clone());
    if cookies.is_empty() {
        log::warn!(
            "⚠️  No cookies in {} or {}; perplexity_ask will fail until cookies are set",
            settings.path().display(),
            COOKIES_ENV
        );
    } else {
        log::info!("✅ Session cookies loaded");
    }

    let transport = HttpTransport::new(config.base_url.clone(), config.timeout)?;
    let builder = RequestBuilder::new(config.search_defaults());
    let client = PerplexityClient::new(Arc::new(transport), cookies, builder);

    Ok(ToolHost::new(client, settings, ModelRegistry::default()))
}

pub async fn app_init() -> Result<(Config, Arc<AppState>), Box<dyn Error>> {
    let config = Config::from_env()?;
    log::info!("✅ Configuration loaded");

    let tools = Arc::new(build_tool_host(&config)?);
    log::info!("✅ Tool host ready ({} tools)", tools.definitions().len());

    let state = Arc::new(AppState { tools });
    Ok((config, state))
}

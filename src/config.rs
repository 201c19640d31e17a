use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "planner.toml";
pub const ENV_BASE_URL: &str = "PLANNER_BASE_URL";
pub const ENV_SESSION_COOKIE: &str = "PLANNER_SESSION_COOKIE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid base_url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Where the planner backend lives and how to authenticate against it.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Backend origin, e.g. `http://127.0.0.1:5000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Raw `Cookie` header value of a logged-in backend session
    #[serde(default)]
    pub session_cookie: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String { "http://127.0.0.1:5000".to_string() }
fn default_user_agent() -> String { format!("study-planner/{}", env!("CARGO_PKG_VERSION")) }

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            user_agent: default_user_agent(),
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()
    }

    /// Reads `.env`, then the TOML file at `path` if it exists, then applies
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(cookie) = lookup(ENV_SESSION_COOKIE).filter(|v| !v.trim().is_empty()) {
            self.session_cookie = Some(cookie);
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        url::Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(self)
    }
}

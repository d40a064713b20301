use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::ProviderKind;
use crate::utils;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("config file already exists: {0}")]
    AlreadyExists(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub eventbrite: ProviderSettings,
    pub ticketmaster: ProviderSettings,
    pub meetup: ProviderSettings,
    /// Search fan-out set and create attempt order.
    pub providers: Vec<ProviderKind>,
    pub http_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            eventbrite: ProviderSettings::default(),
            ticketmaster: ProviderSettings::default(),
            meetup: ProviderSettings::default(),
            providers: ProviderKind::ALL.to_vec(),
            http_timeout_secs: None,
            user_agent: None,
        }
    }
}

impl AppConfig {
    /// Reads the config file (if any) and layers the process environment on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path = utils::config_path();
        let mut config = read_config(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Eventbrite => &self.eventbrite,
            ProviderKind::Ticketmaster => &self.ticketmaster,
            ProviderKind::Meetup => &self.meetup,
        }
    }

    fn settings_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::Eventbrite => &mut self.eventbrite,
            ProviderKind::Ticketmaster => &mut self.ticketmaster,
            ProviderKind::Meetup => &mut self.meetup,
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        for kind in ProviderKind::ALL {
            let prefix = kind.env_prefix();
            let settings = self.settings_mut(kind);
            if let Some(key) = lookup(&format!("{prefix}_API_KEY")) {
                settings.api_key = Some(key);
            }
            if let Some(url) = lookup(&format!("{prefix}_BASE_URL")) {
                settings.base_url = Some(url);
            }
        }

        if let Some(order) = lookup("EVENT_SCANNER_PROVIDERS") {
            self.providers = parse_provider_list(&order)?;
        }

        if let Some(raw) = lookup("EVENT_SCANNER_HTTP_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "EVENT_SCANNER_HTTP_TIMEOUT_SECS".to_string(),
                value: raw.clone(),
            })?;
            self.http_timeout_secs = Some(secs);
        }

        if let Some(agent) = lookup("EVENT_SCANNER_USER_AGENT") {
            self.user_agent = Some(agent);
        }

        Ok(())
    }
}

pub fn parse_provider_list(raw: &str) -> Result<Vec<ProviderKind>, ConfigError> {
    let mut out = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = name
            .parse::<ProviderKind>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "EVENT_SCANNER_PROVIDERS".to_string(),
                value: name.to_string(),
            })?;
        if !out.contains(&kind) {
            out.push(kind);
        }
    }
    Ok(out)
}

pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    };
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.display().to_string()));
    }
    utils::ensure_parent(path).map_err(io_err)?;
    let contents = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, contents).map_err(io_err)
}

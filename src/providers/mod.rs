pub mod base;
pub mod eventbrite;
pub mod meetup;
pub mod ticketmaster;

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{CreateEventDto, Event, SearchParams};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} api key is not configured")]
    MissingApiKey(&'static str),
    #[error("http error: {0}")]
    Http(String),
    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0} does not support event creation")]
    Unsupported(&'static str),
}

/// Contract shared by every event provider adapter.
#[async_trait]
pub trait EventProvider: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn base_url(&self) -> &str;

    async fn try_search(&self, params: &SearchParams) -> Result<Vec<Event>, ProviderError>;

    async fn create_event(&self, event: &CreateEventDto) -> Result<Event, ProviderError>;

    /// Search that never fails: errors are logged and collapse to an empty list.
    async fn search_events(&self, params: &SearchParams) -> Vec<Event> {
        match self.try_search(params).await {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(provider = self.id(), error = %err, "search failed");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Eventbrite,
    Ticketmaster,
    Meetup,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Eventbrite,
        ProviderKind::Ticketmaster,
        ProviderKind::Meetup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Eventbrite => "eventbrite",
            ProviderKind::Ticketmaster => "ticketmaster",
            ProviderKind::Meetup => "meetup",
        }
    }

    pub(crate) fn env_prefix(self) -> &'static str {
        match self {
            ProviderKind::Eventbrite => "EVENTBRITE",
            ProviderKind::Ticketmaster => "TICKETMASTER",
            ProviderKind::Meetup => "MEETUP",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl ProviderInfo {
    pub fn of(provider: &dyn EventProvider) -> Self {
        Self {
            id: provider.id().to_string(),
            name: provider.name().to_string(),
            url: provider.base_url().to_string(),
        }
    }
}

/// Builds the adapters named in `config.providers`, in that order, sharing one HTTP client.
pub fn active_providers(config: &AppConfig) -> Result<Vec<Arc<dyn EventProvider>>, ProviderError> {
    let client = base::build_client(config)?;
    Ok(config
        .providers
        .iter()
        .map(|kind| provider_for(*kind, config, client.clone()))
        .collect())
}

fn provider_for(kind: ProviderKind, config: &AppConfig, client: Client) -> Arc<dyn EventProvider> {
    let settings = config.settings(kind).clone();
    match kind {
        ProviderKind::Eventbrite => Arc::new(eventbrite::Eventbrite::new(client, settings)),
        ProviderKind::Ticketmaster => Arc::new(ticketmaster::Ticketmaster::new(client, settings)),
        ProviderKind::Meetup => Arc::new(meetup::Meetup::new(client, settings)),
    }
}

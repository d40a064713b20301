use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{CreateEventDto, Event, SearchParams};
use crate::providers::{self, base, EventProvider, ProviderError, ProviderInfo};

#[derive(Debug)]
pub struct FailedAttempt {
    pub provider: String,
    pub error: ProviderError,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Every provider rejected the event; `attempts` keeps the reasons in provider order.
    #[error("No service was able to create the event")]
    NoProvider { attempts: Vec<FailedAttempt> },
    #[error("unknown provider id: {0}")]
    UnknownProvider(String),
    #[error("missing required field: {0}")]
    InvalidEvent(&'static str),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderOutcome {
    pub provider: String,
    /// Number of events found, or why the provider contributed nothing.
    pub result: Result<usize, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub events: Vec<Event>,
    pub outcomes: Vec<ProviderOutcome>,
}

impl SearchReport {
    pub fn failures(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }
}

/// Single search/create surface over every configured provider.
pub struct EventService {
    providers: Vec<Arc<dyn EventProvider>>,
}

impl EventService {
    pub fn new(providers: Vec<Arc<dyn EventProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(providers::active_providers(config)?))
    }

    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|provider| ProviderInfo::of(provider.as_ref()))
            .collect()
    }

    /// Merged results of every provider, oldest first. Never fails.
    pub async fn search_events(&self, params: &SearchParams) -> Vec<Event> {
        self.search_report(params).await.events
    }

    pub async fn search_report(&self, params: &SearchParams) -> SearchReport {
        let shared = Arc::new(params.clone());
        let handles: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let params = Arc::clone(&shared);
                tokio::spawn(async move { provider.try_search(&params).await })
            })
            .collect();

        let mut events = Vec::new();
        let mut outcomes = Vec::with_capacity(handles.len());

        for (provider, joined) in self.providers.iter().zip(join_all(handles).await) {
            let result = match joined {
                Ok(Ok(mut found)) => {
                    let count = found.len();
                    events.append(&mut found);
                    Ok(count)
                }
                Ok(Err(err)) => {
                    tracing::warn!(provider = provider.id(), error = %err, "provider search failed");
                    Err(err.to_string())
                }
                Err(err) => {
                    tracing::warn!(provider = provider.id(), error = %err, "provider search task aborted");
                    Err(format!("search task failed: {err}"))
                }
            };
            outcomes.push(ProviderOutcome {
                provider: provider.id().to_string(),
                result,
            });
        }

        sort_by_date(&mut events);
        tracing::debug!(total = events.len(), "merged provider results");
        SearchReport { events, outcomes }
    }

    /// Searches one provider by id; failures collapse to an empty list.
    pub async fn search_provider(
        &self,
        id: &str,
        params: &SearchParams,
    ) -> Result<Vec<Event>, ServiceError> {
        let provider = self
            .find_provider(id)
            .ok_or_else(|| ServiceError::UnknownProvider(id.to_string()))?;
        let mut events = provider.search_events(params).await;
        sort_by_date(&mut events);
        Ok(events)
    }

    /// Tries providers in configured order and returns the first created event.
    pub async fn create_event(&self, event: &CreateEventDto) -> Result<Event, ServiceError> {
        event.validate().map_err(ServiceError::InvalidEvent)?;

        let mut attempts = Vec::new();
        for provider in &self.providers {
            match provider.create_event(event).await {
                Ok(created) => {
                    tracing::info!(provider = provider.id(), id = %created.id, "event created");
                    return Ok(created);
                }
                Err(err) => {
                    tracing::warn!(provider = provider.id(), error = %err, "event creation failed, trying next provider");
                    attempts.push(FailedAttempt {
                        provider: provider.id().to_string(),
                        error: err,
                    });
                }
            }
        }

        Err(ServiceError::NoProvider { attempts })
    }

    fn find_provider(&self, id: &str) -> Option<&Arc<dyn EventProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.id().eq_ignore_ascii_case(id.trim()))
    }
}

/// Stable ascending sort on parsed dates; unparseable dates go last.
pub fn sort_by_date(events: &mut [Event]) {
    events.sort_by_cached_key(|event| {
        let parsed = base::parse_event_date(&event.date);
        (parsed.is_none(), parsed)
    });
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::ProviderError;
use crate::config::AppConfig;

const DEFAULT_USER_AGENT: &str = "EventScanner/0.1 (+https://github.com/event-scanner/event-scanner)";

pub fn build_client(config: &AppConfig) -> Result<Client, ProviderError> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(timeout) = config.http_timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| ProviderError::Http(format!("unable to build http client: {err}")))
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn require_key<'a>(
    provider: &'static str,
    key: &'a Option<String>,
) -> Result<&'a str, ProviderError> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(ProviderError::MissingApiKey(provider))
}

/// Sends the request and decodes a JSON body, treating any non-2xx status as an error.
pub async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|err| ProviderError::Http(format!("{provider} request failed: {err}")))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| ProviderError::Http(format!("{provider} body unreadable: {err}")))?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text)
        .map_err(|err| ProviderError::Parse(format!("{provider} payload: {err}")))
}

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed, non-empty text or the fallback.
pub fn text_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Parses the date forms providers emit. Offset-less values are read as UTC.
pub fn parse_event_date(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

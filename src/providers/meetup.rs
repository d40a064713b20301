use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::base;
use super::{EventProvider, ProviderError};
use crate::config::ProviderSettings;
use crate::models::{CreateEventDto, Event, SearchParams, LOCATION_PLACEHOLDER};

const PROVIDER_ID: &str = "meetup";
const PROVIDER_NAME: &str = "Meetup";
const DEFAULT_BASE_URL: &str = "https://api.meetup.com";
const PRICE_PLACEHOLDER: &str = "Free";

static VENUE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("venue id regex"));

pub struct Meetup {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    events: Vec<EventDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventDoc {
    id: String,
    name: Option<String>,
    local_date: Option<String>,
    local_time: Option<String>,
    venue: Option<VenueDoc>,
    description: Option<String>,
    featured_photo: Option<PhotoDoc>,
    group: Option<GroupDoc>,
    fee: Option<FeeDoc>,
}

#[derive(Debug, Deserialize)]
struct VenueDoc {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoDoc {
    photo_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupDoc {
    category: Option<CategoryDoc>,
}

#[derive(Debug, Deserialize)]
struct CategoryDoc {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeeDoc {
    amount: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePayload<'a> {
    name: &'a str,
    description: &'a str,
    time: &'a str,
    venue_id: &'a str,
}

impl Meetup {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self {
            client,
            api_key: settings.api_key,
            base_url: settings
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn query(api_key: &str, params: &SearchParams) -> Vec<(&'static str, String)> {
        let mut query = vec![("key", api_key.to_string())];
        if let Some(keyword) = params.keyword() {
            query.push(("text", keyword.to_string()));
        }
        if let Some(city) = params.city() {
            query.push(("city", city.to_string()));
        }
        if let Some(category) = params.category() {
            query.push(("category", category.to_string()));
        }
        query
    }
}

#[async_trait]
impl EventProvider for Meetup {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn try_search(&self, params: &SearchParams) -> Result<Vec<Event>, ProviderError> {
        let api_key = base::require_key(PROVIDER_ID, &self.api_key)?;
        let url = base::endpoint(&self.base_url, "find/upcoming_events");
        tracing::debug!(provider = PROVIDER_ID, %url, "searching events");

        let request = self.client.get(url).query(&Self::query(api_key, params));
        let payload: SearchResponse = base::send_json(PROVIDER_ID, request).await?;
        Ok(payload.events.into_iter().map(normalize).collect())
    }

    async fn create_event(&self, event: &CreateEventDto) -> Result<Event, ProviderError> {
        let api_key = base::require_key(PROVIDER_ID, &self.api_key)?;
        let venue_id = event.location.trim();
        if !VENUE_ID_RE.is_match(venue_id) {
            // Meetup expects a registered venue id here.
            tracing::warn!(
                provider = PROVIDER_ID,
                location = venue_id,
                "location is not a numeric venue id"
            );
        }

        let url = base::endpoint(&self.base_url, "events");
        let request = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&CreatePayload {
                name: &event.name,
                description: &event.description,
                time: &event.date,
                venue_id,
            });

        match base::send_json::<EventDoc>(PROVIDER_ID, request).await {
            Ok(doc) => Ok(normalize(doc)),
            Err(err) => {
                tracing::error!(provider = PROVIDER_ID, error = %err, "event creation failed");
                Err(err)
            }
        }
    }
}

fn normalize(doc: EventDoc) -> Event {
    let date_part = base::non_empty(doc.local_date.as_deref());
    let time_part = base::non_empty(doc.local_time.as_deref());
    let date = match (date_part, time_part) {
        (Some(date), Some(time)) => format!("{date}T{time}"),
        (Some(date), None) => date,
        (None, _) => String::new(),
    };

    let price = doc
        .fee
        .as_ref()
        .and_then(|fee| {
            let amount = fee.amount?;
            let currency = fee.currency.as_deref().unwrap_or("").trim();
            Some(format!("{amount} {currency}").trim_end().to_string())
        })
        .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string());

    Event {
        id: doc.id,
        source: PROVIDER_ID.to_string(),
        name: base::text_or(doc.name.as_deref(), ""),
        date,
        location: base::text_or(
            doc.venue.as_ref().and_then(|v| v.name.as_deref()),
            LOCATION_PLACEHOLDER,
        ),
        description: base::non_empty(doc.description.as_deref()).unwrap_or_default(),
        image_url: base::non_empty(
            doc.featured_photo
                .as_ref()
                .and_then(|p| p.photo_link.as_deref()),
        ),
        category: base::non_empty(
            doc.group
                .as_ref()
                .and_then(|g| g.category.as_ref())
                .and_then(|c| c.name.as_deref()),
        ),
        price: Some(price),
    }
}

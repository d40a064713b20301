use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::base;
use super::{EventProvider, ProviderError};
use crate::config::ProviderSettings;
use crate::models::{CreateEventDto, Event, SearchParams, LOCATION_PLACEHOLDER};

const PROVIDER_ID: &str = "ticketmaster";
const PROVIDER_NAME: &str = "Ticketmaster";
const DEFAULT_BASE_URL: &str = "https://app.ticketmaster.com/discovery/v2";
const PRICE_PLACEHOLDER: &str = "Price TBA";

pub struct Ticketmaster {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEvents {
    #[serde(default)]
    events: Vec<EventDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EventDoc {
    id: String,
    name: Option<String>,
    info: Option<String>,
    description: Option<String>,
    dates: Option<DatesDoc>,
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedVenues>,
    images: Vec<ImageDoc>,
    classifications: Vec<ClassificationDoc>,
    price_ranges: Vec<PriceRangeDoc>,
}

#[derive(Debug, Deserialize)]
struct DatesDoc {
    start: Option<StartDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartDoc {
    date_time: Option<String>,
    local_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedVenues {
    #[serde(default)]
    venues: Vec<VenueDoc>,
}

#[derive(Debug, Deserialize)]
struct VenueDoc {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageDoc {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClassificationDoc {
    segment: Option<SegmentDoc>,
}

#[derive(Debug, Deserialize)]
struct SegmentDoc {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceRangeDoc {
    min: Option<f64>,
    max: Option<f64>,
    currency: Option<String>,
}

impl Ticketmaster {
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
        let mut query = vec![("apikey", api_key.to_string())];
        if let Some(keyword) = params.keyword() {
            query.push(("keyword", keyword.to_string()));
        }
        if let Some(city) = params.city() {
            query.push(("city", city.to_string()));
        }
        if let Some(category) = params.category() {
            query.push(("classificationName", category.to_string()));
        }
        query
    }
}

#[async_trait]
impl EventProvider for Ticketmaster {
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
        let url = base::endpoint(&self.base_url, "events.json");
        tracing::debug!(provider = PROVIDER_ID, %url, "searching events");

        let request = self.client.get(url).query(&Self::query(api_key, params));
        let payload: SearchResponse = base::send_json(PROVIDER_ID, request).await?;
        Ok(payload
            .embedded
            .map(|embedded| embedded.events)
            .unwrap_or_default()
            .into_iter()
            .map(normalize)
            .collect())
    }

    async fn create_event(&self, _event: &CreateEventDto) -> Result<Event, ProviderError> {
        Err(ProviderError::Unsupported(PROVIDER_NAME))
    }
}

fn normalize(doc: EventDoc) -> Event {
    let start = doc.dates.as_ref().and_then(|d| d.start.as_ref());
    let date = start
        .and_then(|s| base::non_empty(s.date_time.as_deref()))
        .or_else(|| start.and_then(|s| base::non_empty(s.local_date.as_deref())))
        .unwrap_or_default();

    let location = base::text_or(
        doc.embedded
            .as_ref()
            .and_then(|e| e.venues.first())
            .and_then(|v| v.name.as_deref()),
        LOCATION_PLACEHOLDER,
    );

    let description = base::non_empty(doc.description.as_deref())
        .or_else(|| base::non_empty(doc.info.as_deref()))
        .unwrap_or_default();

    Event {
        id: doc.id,
        source: PROVIDER_ID.to_string(),
        name: base::text_or(doc.name.as_deref(), ""),
        date,
        location,
        description,
        image_url: base::non_empty(doc.images.first().and_then(|i| i.url.as_deref())),
        category: base::non_empty(
            doc.classifications
                .first()
                .and_then(|c| c.segment.as_ref())
                .and_then(|s| s.name.as_deref()),
        ),
        price: Some(
            doc.price_ranges
                .first()
                .and_then(format_price_range)
                .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string()),
        ),
    }
}

fn format_price_range(range: &PriceRangeDoc) -> Option<String> {
    let min = range.min?;
    let max = range.max.unwrap_or(min);
    let currency = range.currency.as_deref().unwrap_or("").trim();
    let text = format!("{min} - {max} {currency}");
    Some(text.trim_end().to_string())
}

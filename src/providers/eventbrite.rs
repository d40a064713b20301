use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::base;
use super::{EventProvider, ProviderError};
use crate::config::ProviderSettings;
use crate::models::{CreateEventDto, Event, SearchParams, LOCATION_PLACEHOLDER};

const PROVIDER_ID: &str = "eventbrite";
const PROVIDER_NAME: &str = "Eventbrite";
const DEFAULT_BASE_URL: &str = "https://www.eventbriteapi.com/v3";
const PRICE_PLACEHOLDER: &str = "Free";

pub struct Eventbrite {
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
    name: Option<TextDoc>,
    description: Option<TextDoc>,
    start: Option<StartDoc>,
    venue: Option<VenueDoc>,
    logo: Option<LogoDoc>,
    category: Option<CategoryDoc>,
    ticket_classes: Vec<TicketClassDoc>,
}

#[derive(Debug, Deserialize)]
struct TextDoc {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartDoc {
    local: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VenueDoc {
    address: Option<AddressDoc>,
}

#[derive(Debug, Deserialize)]
struct AddressDoc {
    localized_address_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogoDoc {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryDoc {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TicketClassDoc {
    cost: Option<CostDoc>,
}

#[derive(Debug, Deserialize)]
struct CostDoc {
    display: Option<String>,
}

impl Eventbrite {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self {
            client,
            api_key: settings.api_key,
            base_url: settings
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn query(params: &SearchParams) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(keyword) = params.keyword() {
            query.push(("q", keyword.to_string()));
        }
        if let Some(city) = params.city() {
            query.push(("location.address", city.to_string()));
        }
        if let Some(category) = params.category() {
            query.push(("categories", category.to_string()));
        }
        query
    }

    fn create_payload(event: &CreateEventDto) -> serde_json::Value {
        json!({
            "event": {
                "name": { "html": event.name },
                "description": { "html": event.description },
                "start": { "timezone": "UTC", "utc": event.date },
                "end": { "timezone": "UTC", "utc": event.date },
                "currency": "USD",
            }
        })
    }
}

#[async_trait]
impl EventProvider for Eventbrite {
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
        let token = base::require_key(PROVIDER_ID, &self.api_key)?;
        let url = base::endpoint(&self.base_url, "events/search/");
        tracing::debug!(provider = PROVIDER_ID, %url, "searching events");

        let request = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&Self::query(params));
        let payload: SearchResponse = base::send_json(PROVIDER_ID, request).await?;
        Ok(payload.events.into_iter().map(normalize).collect())
    }

    async fn create_event(&self, event: &CreateEventDto) -> Result<Event, ProviderError> {
        let token = base::require_key(PROVIDER_ID, &self.api_key)?;
        let url = base::endpoint(&self.base_url, "events/");
        let request = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&Self::create_payload(event));

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
    let price = doc
        .ticket_classes
        .first()
        .and_then(|class| class.cost.as_ref())
        .and_then(|cost| base::non_empty(cost.display.as_deref()))
        .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string());

    Event {
        id: doc.id,
        source: PROVIDER_ID.to_string(),
        name: base::text_or(doc.name.as_ref().and_then(|n| n.text.as_deref()), ""),
        date: base::text_or(doc.start.as_ref().and_then(|s| s.local.as_deref()), ""),
        location: base::text_or(
            doc.venue
                .as_ref()
                .and_then(|v| v.address.as_ref())
                .and_then(|a| a.localized_address_display.as_deref()),
            LOCATION_PLACEHOLDER,
        ),
        description: base::non_empty(doc.description.as_ref().and_then(|d| d.text.as_deref()))
            .unwrap_or_default(),
        image_url: base::non_empty(doc.logo.as_ref().and_then(|l| l.url.as_deref())),
        category: base::non_empty(doc.category.as_ref().and_then(|c| c.name.as_deref())),
        price: Some(price),
    }
}

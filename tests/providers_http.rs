use event_scanner::config::{AppConfig, ProviderSettings};
use event_scanner::providers::eventbrite::Eventbrite;
use event_scanner::providers::meetup::Meetup;
use event_scanner::providers::ticketmaster::Ticketmaster;
use event_scanner::{
    CreateEventDto, EventProvider, EventService, ProviderError, ProviderKind, SearchParams,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(key: Option<&str>, base_url: String) -> ProviderSettings {
    ProviderSettings {
        api_key: key.map(str::to_string),
        base_url: Some(base_url),
    }
}

fn dto(location: &str) -> CreateEventDto {
    CreateEventDto {
        name: "Rooftop Sessions".to_string(),
        date: "2024-08-01T19:00:00Z".to_string(),
        location: location.to_string(),
        description: "Sunset DJ sets".to_string(),
        category: None,
        price: None,
        image_url: None,
    }
}

fn eventbrite_event(id: &str, name: &str, local: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": { "text": name },
        "description": { "text": "desc" },
        "start": { "local": local },
        "venue": { "address": { "localized_address_display": "Somewhere" } },
        "ticket_classes": [ { "cost": { "display": "$20.00" } } ]
    })
}

#[tokio::test]
async fn eventbrite_search_sends_bearer_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/search/"))
        .and(header("authorization", "Bearer eb-token"))
        .and(query_param("q", "jazz"))
        .and(query_param("location.address", "Seattle"))
        .and(query_param("categories", "103"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [eventbrite_event("1", "Late Night Jazz", "2024-05-01T22:00:00")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Eventbrite::new(Client::new(), settings(Some("eb-token"), server.uri()));
    let params = SearchParams {
        keyword: Some("jazz".to_string()),
        city: Some("Seattle".to_string()),
        category: Some("103".to_string()),
        ..SearchParams::default()
    };
    let events = provider.try_search(&params).await.expect("search succeeds");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Late Night Jazz");
    assert_eq!(events[0].price.as_deref(), Some("$20.00"));
}

#[tokio::test]
async fn error_status_collapses_to_empty_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/search/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let provider = Eventbrite::new(Client::new(), settings(Some("k"), server.uri()));
    let err = provider
        .try_search(&SearchParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    assert!(provider.search_events(&SearchParams::default()).await.is_empty());
}

#[tokio::test]
async fn malformed_payload_collapses_to_empty_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find/upcoming_events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let provider = Meetup::new(Client::new(), settings(Some("k"), server.uri()));
    let err = provider
        .try_search(&SearchParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));
    assert!(provider.search_events(&SearchParams::default()).await.is_empty());
}

#[tokio::test]
async fn missing_key_skips_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = Meetup::new(Client::new(), settings(None, server.uri()));
    assert!(provider.search_events(&SearchParams::default()).await.is_empty());
    let err = provider.create_event(&dto("42")).await.unwrap_err();
    assert!(matches!(err, ProviderError::MissingApiKey("meetup")));
}

#[tokio::test]
async fn ticketmaster_create_never_touches_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = Ticketmaster::new(Client::new(), settings(Some("tm"), server.uri()));
    let err = provider.create_event(&dto("Gorge")).await.unwrap_err();
    assert_eq!(err.to_string(), "Ticketmaster does not support event creation");
}

#[tokio::test]
async fn ticketmaster_search_uses_apikey_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events.json"))
        .and(query_param("apikey", "tm-key"))
        .and(query_param("keyword", "odesza"))
        .and(query_param("city", "Seattle"))
        .and(query_param("classificationName", "Music"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "events": [ {
                "id": "TM1",
                "name": "Arena Show",
                "dates": { "start": { "localDate": "2024-04-01" } },
                "priceRanges": [ { "min": 40, "max": 80, "currency": "USD" } ]
            } ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Ticketmaster::new(Client::new(), settings(Some("tm-key"), server.uri()));
    let params = SearchParams {
        keyword: Some("odesza".to_string()),
        city: Some("Seattle".to_string()),
        category: Some("Music".to_string()),
        ..SearchParams::default()
    };
    let events = provider.try_search(&params).await.expect("search succeeds");
    assert_eq!(events[0].price.as_deref(), Some("40 - 80 USD"));
    assert_eq!(events[0].location, "TBA");
}

#[tokio::test]
async fn meetup_create_posts_location_as_venue_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(query_param("key", "mu-key"))
        .and(body_partial_json(json!({
            "name": "Rooftop Sessions",
            "venue_id": "2648105",
            "time": "2024-08-01T19:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "evt-9",
            "name": "Rooftop Sessions",
            "local_date": "2024-08-01",
            "local_time": "19:00",
            "venue": { "name": "The Roof" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Meetup::new(Client::new(), settings(Some("mu-key"), server.uri()));
    let created = provider.create_event(&dto("2648105")).await.expect("created");
    assert_eq!(created.id, "evt-9");
    assert_eq!(created.date, "2024-08-01T19:00");
    assert_eq!(created.location, "The Roof");
}

#[tokio::test]
async fn eventbrite_create_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let provider = Eventbrite::new(Client::new(), settings(Some("k"), server.uri()));
    let err = provider.create_event(&dto("Pier 39")).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 400, .. }));
}

fn config_for(server: &MockServer, order: Vec<ProviderKind>) -> AppConfig {
    AppConfig {
        eventbrite: settings(Some("eb"), server.uri()),
        ticketmaster: settings(Some("tm"), format!("{}/discovery/v2", server.uri())),
        meetup: settings(Some("mu"), server.uri()),
        providers: order,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn aggregate_search_over_real_adapters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [eventbrite_event("A", "Event A", "2024-05-01T20:00:00")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discovery/v2/events.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "events": [ {
                "id": "B",
                "name": "Event B",
                "dates": { "start": { "localDate": "2024-04-01" } }
            } ] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/find/upcoming_events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = EventService::from_config(&config_for(&server, ProviderKind::ALL.to_vec()))
        .expect("service");
    let report = service.search_report(&SearchParams::default()).await;
    let ids: Vec<_> = report.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A"]);
    let failed: Vec<_> = report.failures().map(|o| o.provider.as_str()).collect();
    assert_eq!(failed, vec!["meetup"]);
}

#[tokio::test]
async fn aggregate_create_falls_through_ticketmaster() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/"))
        .and(header("authorization", "Bearer eb"))
        .and(body_partial_json(json!({
            "event": {
                "name": { "html": "Rooftop Sessions" },
                "description": { "html": "Sunset DJ sets" },
                "start": { "timezone": "UTC", "utc": "2024-08-01T19:00:00Z" },
                "end": { "timezone": "UTC", "utc": "2024-08-01T19:00:00Z" },
                "currency": "USD"
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(eventbrite_event("EB-NEW", "Rooftop Sessions", "2024-08-01T19:00:00")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let order = vec![
        ProviderKind::Ticketmaster,
        ProviderKind::Eventbrite,
        ProviderKind::Meetup,
    ];
    let service = EventService::from_config(&config_for(&server, order)).expect("service");
    let created = service.create_event(&dto("Pier 39")).await.expect("created");
    assert_eq!(created.id, "EB-NEW");
    assert_eq!(created.source, "eventbrite");
}

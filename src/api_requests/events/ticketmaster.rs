use crate::error::{Result, TripError};
use crate::utils::Date;
use chrono::Days;
use serde::Deserialize;
use std::env;

const BASE_URL: &str = "https://app.ticketmaster.com/discovery/v2/events.json";

/// Number of days after the requested date to include in the window.
const WINDOW_DAYS: u64 = 5;
/// Keep the report readable; popular cities return hundreds of events.
const MAX_EVENTS: usize = 20;

const UNKNOWN_VENUE: &str = "Unknown venue";

#[derive(Debug, Clone)]
pub struct EventSearchRequest {
    pub city: String,
    pub date: Date,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventSearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmbeddedEvents {
    events: Vec<RawEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEvent {
    name: Option<String>,
    url: Option<String>,
    dates: Option<RawEventDates>,
    #[serde(rename = "_embedded")]
    embedded: Option<RawEventEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEventDates {
    start: Option<RawEventStart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawEventStart {
    date_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEventEmbedded {
    venues: Vec<RawVenue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVenue {
    name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub venue: String,
    pub start: String,
    pub url: Option<String>,
}

/// UTC day boundaries for the requested date plus the following window.
fn search_window(date: Date) -> (String, String) {
    let start = date.to_naive();
    let end = start.checked_add_days(Days::new(WINDOW_DAYS)).unwrap_or(start);
    (
        format!("{}T00:00:00Z", start.format("%Y-%m-%d")),
        format!("{}T00:00:00Z", end.format("%Y-%m-%d")),
    )
}

/// Flatten the discovery response. Events come back in relevance order;
/// the first `MAX_EVENTS` are kept so results stay reproducible.
pub fn normalize_events(response: &EventSearchResponse) -> Vec<Event> {
    let Some(embedded) = &response.embedded else {
        return Vec::new();
    };
    embedded
        .events
        .iter()
        .take(MAX_EVENTS)
        .map(|event| Event {
            name: event.name.clone().unwrap_or_else(|| "Untitled event".to_string()),
            venue: event
                .embedded
                .as_ref()
                .and_then(|embedded| embedded.venues.first())
                .and_then(|venue| venue.name.clone())
                .unwrap_or_else(|| UNKNOWN_VENUE.to_string()),
            start: event
                .dates
                .as_ref()
                .and_then(|dates| dates.start.as_ref())
                .and_then(|start| start.date_time.clone())
                .unwrap_or_default(),
            url: event.url.clone(),
        })
        .collect()
}

pub fn render_event_table(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }
    let mut lines = vec![
        "## Event Options".to_string(),
        "| Venue | Event | Start |".to_string(),
        "|-------|-------|-------|".to_string(),
    ];
    for event in events {
        // Link the name when the vendor gave us a ticket page.
        let name = match &event.url {
            Some(url) => format!("[{}]({url})", event.name),
            None => event.name.clone(),
        };
        lines.push(format!("| {} | {} | {} |", event.venue, name, event.start));
    }
    lines.join("\n")
}

/// Events in a city over the requested date and the five days after it.
pub async fn search_events(request: &EventSearchRequest) -> Result<Vec<Event>> {
    let api_key = env::var("TICKETMASTER_API_KEY")
        .map_err(|_| TripError::Config("TICKETMASTER_API_KEY not set".to_string()))?;

    let (start, end) = search_window(request.date);

    log::info!("event search in {} from {start}", request.city);

    let client = reqwest::Client::new();
    let resp = client
        .get(BASE_URL)
        .query(&[
            ("apikey", api_key.as_str()),
            ("city", request.city.as_str()),
            ("startDateTime", start.as_str()),
            ("endDateTime", end.as_str()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TripError::SearchFailed(format!(
            "event search returned {status}: {body}"
        )));
    }

    let payload: EventSearchResponse = resp.json().await?;
    Ok(normalize_events(&payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn window_spans_five_days_across_month_ends() {
        let (start, end) = search_window(Date::new(2025, 6, 28).unwrap());
        assert_eq!(start, "2025-06-28T00:00:00Z");
        assert_eq!(end, "2025-07-03T00:00:00Z");
    }

    #[test]
    fn events_normalize_with_venue_and_start() {
        let payload: EventSearchResponse = serde_json::from_value(json!({
            "_embedded": {
                "events": [{
                    "name": "Primavera Sound",
                    "url": "https://example.com/tickets",
                    "dates": {"start": {"dateTime": "2025-06-15T18:00:00Z"}},
                    "_embedded": {"venues": [{"name": "Parc del Forum"}]}
                }]
            }
        }))
        .unwrap();
        let events = normalize_events(&payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Primavera Sound");
        assert_eq!(events[0].venue, "Parc del Forum");
        assert_eq!(events[0].start, "2025-06-15T18:00:00Z");
        assert_eq!(events[0].url.as_deref(), Some("https://example.com/tickets"));
    }

    #[test]
    fn missing_embedded_block_means_no_events() {
        let payload: EventSearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(normalize_events(&payload).is_empty());
    }

    #[test]
    fn sparse_event_degrades_to_sentinels() {
        let payload: EventSearchResponse = serde_json::from_value(json!({
            "_embedded": {"events": [{}]}
        }))
        .unwrap();
        let events = normalize_events(&payload);
        assert_eq!(events[0].venue, UNKNOWN_VENUE);
        assert_eq!(events[0].name, "Untitled event");
        assert!(events[0].start.is_empty());
    }

    #[test]
    fn normalization_caps_the_event_count() {
        let many: Vec<_> = (0..40)
            .map(|i| json!({"name": format!("Event {i}")}))
            .collect();
        let payload: EventSearchResponse =
            serde_json::from_value(json!({"_embedded": {"events": many}})).unwrap();
        assert_eq!(normalize_events(&payload).len(), MAX_EVENTS);
    }

    #[test]
    fn table_lists_venue_first() {
        let events = vec![Event {
            name: "Primavera Sound".to_string(),
            venue: "Parc del Forum".to_string(),
            start: "2025-06-15T18:00:00Z".to_string(),
            url: None,
        }];
        let table = render_event_table(&events);
        assert!(table.contains("| Parc del Forum | Primavera Sound | 2025-06-15T18:00:00Z |"));
    }

    #[test]
    fn table_links_events_with_a_ticket_page() {
        let events = vec![Event {
            name: "Primavera Sound".to_string(),
            venue: "Parc del Forum".to_string(),
            start: "2025-06-15T18:00:00Z".to_string(),
            url: Some("https://example.com/tickets".to_string()),
        }];
        let table = render_event_table(&events);
        assert!(table.contains("[Primavera Sound](https://example.com/tickets)"));
    }
}

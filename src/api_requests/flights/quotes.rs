use crate::utils::{Date, Money};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Sentinel substituted for any carrier or place the vendor response
/// failed to resolve.
pub const UNKNOWN: &str = "Unknown";

/// The three id-keyed mappings at the heart of the vendor response.
/// Quotes reference carriers and places by opaque id; nothing is embedded.
/// Every field is optional or defaulted because the vendor schema has
/// shifted between API revisions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawQuoteGraph {
    quotes: HashMap<String, RawQuote>,
    carriers: HashMap<String, RawCarrier>,
    places: HashMap<String, RawPlace>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawQuote {
    min_price: Option<RawPrice>,
    is_direct: Option<bool>,
    outbound_leg: Option<RawLeg>,
    inbound_leg: Option<RawLeg>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPrice {
    // Arrives as a JSON string in current responses but has been seen as
    // a bare number; coerced in parse_amount.
    amount: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawLeg {
    origin_place_id: Option<String>,
    destination_place_id: Option<String>,
    marketing_carrier_id: Option<String>,
    departure_date_time: Option<RawDate>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
struct RawDate {
    year: i32,
    month: i32,
    day: i32,
}

impl RawDate {
    /// A usable date has all components positive and on the calendar;
    /// anything else means "date unknown".
    fn to_date(self) -> Option<Date> {
        if self.year <= 0 || self.month <= 0 || self.day <= 0 {
            return None;
        }
        let year = u16::try_from(self.year).ok()?;
        let month = u8::try_from(self.month).ok()?;
        let day = u8::try_from(self.day).ok()?;
        Date::new(year, month, day).ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCarrier {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlace {
    name: Option<String>,
    iata: Option<String>,
}

/// One flight option with every foreign key resolved. This is the only
/// shape handed to callers; the raw graph never leaves this module.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightOption {
    pub quote_id: String,
    pub price: Money,
    pub origin: String,
    pub destination: String,
    pub carrier: String,
    pub direct: bool,
    pub departure_date: Option<Date>,
    pub return_date: Option<Date>,
    /// Set when the price was missing or unusable and degraded to zero.
    pub degraded: bool,
}

/// Flatten the quote graph into self-contained options. Missing sub-fields
/// degrade to sentinels record by record; one malformed quote never spoils
/// the rest, and an empty graph is an empty, successful result.
pub fn normalize(raw: &RawQuoteGraph, requested_currency: &str) -> Vec<FlightOption> {
    let mut options = Vec::with_capacity(raw.quotes.len());
    for (quote_id, quote) in &raw.quotes {
        let leg = quote.outbound_leg.as_ref();

        let amount = quote
            .min_price
            .as_ref()
            .and_then(|price| price.amount.as_ref())
            .and_then(parse_amount);
        let degraded = amount.is_none();
        if degraded {
            log::warn!("quote {quote_id}: minPrice.amount missing or unusable, degrading to zero");
        }

        let carrier = leg
            .and_then(|leg| leg.marketing_carrier_id.as_deref())
            .and_then(|id| raw.carriers.get(id))
            .and_then(|carrier| carrier.name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());

        options.push(FlightOption {
            quote_id: quote_id.clone(),
            price: Money::new(amount.unwrap_or(0.0), requested_currency),
            origin: resolve_place(leg.and_then(|leg| leg.origin_place_id.as_deref()), raw),
            destination: resolve_place(leg.and_then(|leg| leg.destination_place_id.as_deref()), raw),
            carrier,
            direct: quote.is_direct.unwrap_or(false),
            departure_date: leg.and_then(|leg| leg.departure_date_time).and_then(RawDate::to_date),
            return_date: quote
                .inbound_leg
                .as_ref()
                .and_then(|leg| leg.departure_date_time)
                .and_then(RawDate::to_date),
            degraded,
        });
    }
    options
}

pub(crate) fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

fn resolve_place(place_id: Option<&str>, raw: &RawQuoteGraph) -> String {
    place_id
        .and_then(|id| raw.places.get(id))
        .and_then(|place| place.iata.clone().or_else(|| place.name.clone()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// The option with the lowest numeric price. Quote iteration order is not
/// meaningful, so exact ties resolve arbitrarily; callers that need a
/// stable winner sort on a secondary key first.
pub fn cheapest(options: &[FlightOption]) -> Option<&FlightOption> {
    options
        .iter()
        .min_by(|a, b| a.price.amount.total_cmp(&b.price.amount))
}

/// Markdown rendering of already-resolved options, for dropping straight
/// into a model prompt or email body. A pure formatting pass: it never
/// looks at the raw graph.
pub fn render_table(options: &[FlightOption]) -> String {
    if options.is_empty() {
        return "No flight options found.".to_string();
    }
    let mut lines = vec![
        "## Flight Options".to_string(),
        "| Carrier | Price | Direct | Departure |".to_string(),
        "|---------|-------|--------|-----------|".to_string(),
    ];
    for option in options {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            option.carrier,
            option.price,
            if option.direct { "yes" } else { "no" },
            option
                .departure_date
                .map(|date| date.to_yyyy_mm_dd())
                .unwrap_or_else(|| "-".to_string()),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(value: Value) -> RawQuoteGraph {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_graph_normalizes_to_an_empty_list() {
        assert!(normalize(&graph(json!({})), "EUR").is_empty());
        assert!(normalize(&graph(json!({"quotes": {}})), "EUR").is_empty());
    }

    #[test]
    fn fully_populated_quote_resolves_every_field() {
        let raw = graph(json!({
            "quotes": {
                "q1": {
                    "minPrice": {"amount": "120"},
                    "isDirect": true,
                    "outboundLeg": {
                        "marketingCarrierId": "c1",
                        "departureDateTime": {"year": 2025, "month": 6, "day": 15}
                    }
                }
            },
            "carriers": {"c1": {"name": "Air France"}},
            "places": {}
        }));
        let options = normalize(&raw, "EUR");
        assert_eq!(options.len(), 1);
        let option = &options[0];
        assert_eq!(option.price, Money::new(120.0, "EUR"));
        assert_eq!(option.carrier, "Air France");
        assert!(option.direct);
        assert_eq!(
            option.departure_date.unwrap().to_yyyy_mm_dd(),
            "2025-06-15"
        );
        assert!(!option.degraded);
    }

    #[test]
    fn place_ids_resolve_through_the_places_map() {
        let raw = graph(json!({
            "quotes": {
                "q1": {
                    "minPrice": {"amount": "80"},
                    "outboundLeg": {
                        "originPlaceId": "p1",
                        "destinationPlaceId": "p2"
                    }
                }
            },
            "places": {
                "p1": {"iata": "BCN", "name": "Barcelona"},
                "p2": {"name": "London Heathrow"}
            }
        }));
        let options = normalize(&raw, "EUR");
        assert_eq!(options[0].origin, "BCN");
        assert_eq!(options[0].destination, "London Heathrow");
    }

    #[test]
    fn missing_price_degrades_to_zero_instead_of_failing() {
        let raw = graph(json!({
            "quotes": {"q1": {"isDirect": false}}
        }));
        let options = normalize(&raw, "EUR");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].price.amount, 0.0);
        assert!(options[0].degraded);
    }

    #[test]
    fn non_numeric_price_degrades_to_zero() {
        let raw = graph(json!({
            "quotes": {"q1": {"minPrice": {"amount": "n/a"}}}
        }));
        let options = normalize(&raw, "EUR");
        assert_eq!(options[0].price.amount, 0.0);
        assert!(options[0].degraded);
    }

    #[test]
    fn numeric_json_price_is_accepted_too() {
        let raw = graph(json!({
            "quotes": {"q1": {"minPrice": {"amount": 64.5}}}
        }));
        let options = normalize(&raw, "EUR");
        assert_eq!(options[0].price.amount, 64.5);
        assert!(!options[0].degraded);
    }

    #[test]
    fn negative_price_counts_as_unusable() {
        let raw = graph(json!({
            "quotes": {"q1": {"minPrice": {"amount": "-3"}}}
        }));
        let options = normalize(&raw, "EUR");
        assert_eq!(options[0].price.amount, 0.0);
        assert!(options[0].degraded);
    }

    #[test]
    fn unresolved_carrier_falls_back_to_the_sentinel() {
        let raw = graph(json!({
            "quotes": {
                "q1": {
                    "minPrice": {"amount": "99"},
                    "outboundLeg": {"marketingCarrierId": "missing"}
                },
                "q2": {"minPrice": {"amount": "45"}}
            }
        }));
        let options = normalize(&raw, "EUR");
        assert!(options.iter().all(|option| option.carrier == UNKNOWN));
    }

    #[test]
    fn direct_flag_defaults_to_connecting() {
        let raw = graph(json!({
            "quotes": {"q1": {"minPrice": {"amount": "50"}}}
        }));
        assert!(!normalize(&raw, "EUR")[0].direct);
    }

    #[test]
    fn zero_year_means_date_unknown() {
        let raw = graph(json!({
            "quotes": {
                "q1": {
                    "minPrice": {"amount": "50"},
                    "outboundLeg": {
                        "departureDateTime": {"year": 0, "month": 6, "day": 15}
                    }
                }
            }
        }));
        assert!(normalize(&raw, "EUR")[0].departure_date.is_none());
    }

    #[test]
    fn off_calendar_vendor_date_means_date_unknown() {
        let raw = graph(json!({
            "quotes": {
                "q1": {
                    "minPrice": {"amount": "50"},
                    "outboundLeg": {
                        "departureDateTime": {"year": 2025, "month": 2, "day": 30}
                    }
                }
            }
        }));
        assert!(normalize(&raw, "EUR")[0].departure_date.is_none());
    }

    #[test]
    fn cheapest_returns_the_minimum_price_even_on_ties() {
        let raw = graph(json!({
            "quotes": {
                "q1": {"minPrice": {"amount": "99"}},
                "q2": {"minPrice": {"amount": "99"}},
                "q3": {"minPrice": {"amount": "150"}}
            }
        }));
        let options = normalize(&raw, "EUR");
        let best = cheapest(&options).unwrap();
        assert_eq!(best.price.amount, 99.0);
    }

    #[test]
    fn cheapest_of_nothing_is_none() {
        assert!(cheapest(&[]).is_none());
    }

    #[test]
    fn table_renders_the_fixed_column_order() {
        let raw = graph(json!({
            "quotes": {
                "q1": {
                    "minPrice": {"amount": "120"},
                    "isDirect": true,
                    "outboundLeg": {
                        "marketingCarrierId": "c1",
                        "departureDateTime": {"year": 2025, "month": 6, "day": 15}
                    }
                }
            },
            "carriers": {"c1": {"name": "Air France"}}
        }));
        let table = render_table(&normalize(&raw, "EUR"));
        assert!(table.starts_with("## Flight Options"));
        assert!(table.contains("| Carrier | Price | Direct | Departure |"));
        assert!(table.contains("| Air France | 120.00 EUR | yes | 2025-06-15 |"));
    }

    #[test]
    fn empty_options_render_a_no_results_line() {
        assert_eq!(render_table(&[]), "No flight options found.");
    }
}

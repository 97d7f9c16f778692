use crate::api_requests::flights::quotes::parse_amount;
use crate::config::SearchConfig;
use crate::error::{Result, TripError};
use crate::utils::{Date, Money};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;

const BASE_URL: &str =
    "https://partners.api.skyscanner.net/apiservices/v1/carhire/indicative/search";
const GROUPING_BY_WEEK: &str = "DATE_TIME_GROUPING_TYPE_BY_WEEK";

const UNKNOWN_VEHICLE: &str = "Unknown vehicle";
const UNKNOWN_CLASS: &str = "Unknown type";

/// A car hire search. The location is the vendor's own entity id for the
/// pick-up/drop-off point, supplied by the caller.
#[derive(Debug, Clone)]
pub struct CarHireRequest {
    pub location_entity_id: String,
    pub pickup: Date,
    pub dropoff: Date,
}

#[derive(Debug, Serialize)]
pub struct CarHireQueryDocument {
    query: CarHireQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CarHireQuery {
    market: String,
    locale: String,
    currency: String,
    pick_up_date: DateParts,
    drop_off_date: DateParts,
    date_time_grouping_type: &'static str,
    pick_up_drop_off_location_entity_id: String,
}

#[derive(Debug, Serialize)]
struct DateParts {
    year: u16,
    month: u8,
    day: u8,
}

impl From<Date> for DateParts {
    fn from(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

pub fn build_car_query(request: &CarHireRequest, config: &SearchConfig) -> CarHireQueryDocument {
    CarHireQueryDocument {
        query: CarHireQuery {
            market: config.market.clone(),
            locale: config.locale.clone(),
            currency: config.currency.clone(),
            pick_up_date: DateParts::from(request.pickup),
            drop_off_date: DateParts::from(request.dropoff),
            date_time_grouping_type: GROUPING_BY_WEEK,
            pick_up_drop_off_location_entity_id: request.location_entity_id.clone(),
        },
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CarHireSearchResponse {
    content: ResponseContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseContent {
    results: RawCarQuotes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawCarQuotes {
    quotes: HashMap<String, RawCarQuote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCarQuote {
    min_price: Option<RawCarPrice>,
    vehicle_info: Option<RawVehicle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCarPrice {
    amount: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawVehicle {
    name: Option<String>,
    vehicle_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarHireOption {
    pub price: Money,
    pub vehicle: String,
    pub vehicle_class: String,
    pub degraded: bool,
}

pub fn normalize_car_quotes(raw: &RawCarQuotes, requested_currency: &str) -> Vec<CarHireOption> {
    let mut options = Vec::with_capacity(raw.quotes.len());
    for (quote_id, quote) in &raw.quotes {
        let amount = quote
            .min_price
            .as_ref()
            .and_then(|price| price.amount.as_ref())
            .and_then(parse_amount);
        let degraded = amount.is_none();
        if degraded {
            log::warn!("car quote {quote_id}: minPrice.amount missing or unusable");
        }
        let vehicle_info = quote.vehicle_info.as_ref();
        options.push(CarHireOption {
            price: Money::new(amount.unwrap_or(0.0), requested_currency),
            vehicle: vehicle_info
                .and_then(|info| info.name.clone())
                .unwrap_or_else(|| UNKNOWN_VEHICLE.to_string()),
            vehicle_class: vehicle_info
                .and_then(|info| info.vehicle_type.clone())
                .unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
            degraded,
        });
    }
    options
}

pub fn render_car_table(options: &[CarHireOption]) -> String {
    if options.is_empty() {
        return "No car hire options found.".to_string();
    }
    let mut lines = vec![
        "## Car Hire Options".to_string(),
        "| Vehicle | Class | Price |".to_string(),
        "|---------|-------|-------|".to_string(),
    ];
    for option in options {
        lines.push(format!(
            "| {} | {} | {} |",
            option.vehicle, option.vehicle_class, option.price
        ));
    }
    lines.join("\n")
}

/// Indicative car hire prices for one pick-up/drop-off window.
pub async fn search_car_hire(
    request: &CarHireRequest,
    config: &SearchConfig,
) -> Result<Vec<CarHireOption>> {
    let api_key = env::var("SKYSCANNER_API_KEY")
        .map_err(|_| TripError::Config("SKYSCANNER_API_KEY not set".to_string()))?;

    let query = build_car_query(request, config);

    log::info!(
        "car hire search at {} from {} to {}",
        request.location_entity_id,
        request.pickup,
        request.dropoff
    );

    let client = reqwest::Client::new();
    let resp = client
        .post(BASE_URL)
        .header("x-api-key", api_key.as_str())
        .header(CONTENT_TYPE, "application/json")
        .json(&query)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TripError::SearchFailed(format!(
            "car hire search returned {status}: {body}"
        )));
    }

    let payload: CarHireSearchResponse = resp.json().await?;
    Ok(normalize_car_quotes(
        &payload.content.results,
        &config.currency,
    ))
}

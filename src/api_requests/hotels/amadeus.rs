use crate::config::SearchConfig;
use crate::error::{Result, TripError};
use crate::utils::{Date, IataCode, Money, get_bearer_token};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::env;

const OFFERS_URL: &str = "https://test.api.amadeus.com/v3/shopping/hotel-offers";
const HOTEL_LIST_URL: &str =
    "https://test.api.amadeus.com/v1/reference-data/locations/hotels/by-city";

const UNKNOWN_HOTEL: &str = "Unknown hotel";
const UNKNOWN_CHAIN: &str = "-";
const UNKNOWN_ROOM: &str = "No description";

#[derive(Debug, Clone)]
pub struct HotelSearchRequest {
    /// City code, not the airport code.
    pub city_code: IataCode,
    pub check_in: Date,
    pub adults: u8,
    /// How many hotels from the city list to price.
    pub max_hotels: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HotelListResponse {
    data: Vec<HotelReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HotelReference {
    hotel_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HotelOffersResponse {
    data: Vec<RawHotelOffer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHotelOffer {
    hotel: Option<RawHotel>,
    offers: Vec<RawOffer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawHotel {
    name: Option<String>,
    chain_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOffer {
    price: Option<RawOfferPrice>,
    room: Option<RawRoom>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOfferPrice {
    currency: Option<String>,
    total: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRoom {
    description: Option<RawRoomDescription>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRoomDescription {
    text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelOffer {
    pub name: String,
    pub chain_code: String,
    pub price: Money,
    pub room_description: String,
    pub degraded: bool,
}

/// Flatten the best-rate offer of each hotel into a self-contained record.
pub fn normalize_hotel_offers(
    response: &HotelOffersResponse,
    requested_currency: &str,
) -> Vec<HotelOffer> {
    let mut offers = Vec::with_capacity(response.data.len());
    for entry in &response.data {
        let hotel = entry.hotel.as_ref();
        let best_rate = entry.offers.first();
        let price = best_rate.and_then(|offer| offer.price.as_ref());
        let amount = price
            .and_then(|price| price.total.as_deref())
            .and_then(|total| total.trim().parse::<f64>().ok())
            .filter(|amount| amount.is_finite() && *amount >= 0.0);
        let degraded = amount.is_none();
        if degraded {
            log::warn!(
                "hotel {:?}: offer price missing or unusable",
                hotel.and_then(|h| h.name.as_deref()).unwrap_or(UNKNOWN_HOTEL)
            );
        }
        let currency = price
            .and_then(|price| price.currency.as_deref())
            .unwrap_or(requested_currency);
        offers.push(HotelOffer {
            name: hotel
                .and_then(|h| h.name.clone())
                .unwrap_or_else(|| UNKNOWN_HOTEL.to_string()),
            chain_code: hotel
                .and_then(|h| h.chain_code.clone())
                .unwrap_or_else(|| UNKNOWN_CHAIN.to_string()),
            price: Money::new(amount.unwrap_or(0.0), currency),
            room_description: best_rate
                .and_then(|offer| offer.room.as_ref())
                .and_then(|room| room.description.as_ref())
                .and_then(|description| description.text.clone())
                .unwrap_or_else(|| UNKNOWN_ROOM.to_string()),
            degraded,
        });
    }
    offers
}

pub fn render_hotel_table(offers: &[HotelOffer]) -> String {
    if offers.is_empty() {
        return "No hotel offers found.".to_string();
    }
    let mut lines = vec![
        "## Hotel Options".to_string(),
        "| Hotel | Chain | Price | Room |".to_string(),
        "|-------|-------|-------|------|".to_string(),
    ];
    for offer in offers {
        // Multi-line room descriptions would break the table.
        let room = offer.room_description.replace('\n', " ");
        lines.push(format!(
            "| {} | {} | {} | {} |",
            offer.name, offer.chain_code, offer.price, room
        ));
    }
    lines.join("\n")
}

/// Price hotels in a city: list hotel ids by city code, then fetch the
/// best-rate offer for the first `max_hotels` of them. An empty city list
/// is an empty result, not an error.
pub async fn search_hotels(
    request: &HotelSearchRequest,
    config: &SearchConfig,
) -> Result<Vec<HotelOffer>> {
    let client_id = env::var("AMADEUS_API_KEY")
        .map_err(|_| TripError::Config("AMADEUS_API_KEY not set".to_string()))?;
    let client_secret = env::var("AMADEUS_API_SECRET")
        .map_err(|_| TripError::Config("AMADEUS_API_SECRET not set".to_string()))?;

    let token = get_bearer_token(&client_id, &client_secret).await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(HOTEL_LIST_URL)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .query(&[("cityCode", request.city_code.as_str())])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TripError::SearchFailed(format!(
            "hotel list returned {status}: {body}"
        )));
    }

    let list: HotelListResponse = resp.json().await?;
    let hotel_ids: Vec<&str> = list
        .data
        .iter()
        .take(request.max_hotels.into())
        .map(|hotel| hotel.hotel_id.as_str())
        .collect();

    if hotel_ids.is_empty() {
        log::info!("no hotels listed for {}", request.city_code);
        return Ok(Vec::new());
    }

    let resp = client
        .get(OFFERS_URL)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .query(&[
            ("hotelIds", hotel_ids.join(",")),
            ("checkInDate", request.check_in.to_yyyy_mm_dd()),
            ("adults", request.adults.to_string()),
            ("bestRateOnly", "true".to_string()),
            ("currency", config.currency.clone()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TripError::SearchFailed(format!(
            "hotel offers returned {status}: {body}"
        )));
    }

    let payload: HotelOffersResponse = resp.json().await?;
    Ok(normalize_hotel_offers(&payload, &config.currency))
}

use crate::error::{Result, TripError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const AMADEUS_AUTH_URL: &str = "https://test.api.amadeus.com/v1/security/oauth2/token";

/// A calendar date validated at construction, so request builders can stay
/// infallible. Leap years are respected.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

impl Date {
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).is_none() {
            return Err(TripError::InvalidDate(format!(
                "{year:04}-{month:02}-{day:02} is not a calendar date"
            )));
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn to_yyyy_mm_dd(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    pub fn to_naive(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .expect("Date components are validated at construction")
    }

    pub fn from_yyyy_mm_dd(date: &str) -> Result<Self> {
        let mut parts = date.split('-');
        let (Some(year), Some(month), Some(day), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TripError::InvalidDate(format!(
                "expected YYYY-MM-DD, got {date:?}"
            )));
        };
        let year = year
            .parse::<u16>()
            .map_err(|_| TripError::InvalidDate(format!("bad year in {date:?}")))?;
        let month = month
            .parse::<u8>()
            .map_err(|_| TripError::InvalidDate(format!("bad month in {date:?}")))?;
        let day = day
            .parse::<u8>()
            .map_err(|_| TripError::InvalidDate(format!("bad day in {date:?}")))?;
        Self::new(year, month, day)
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_yyyy_mm_dd())
    }
}

/// Three-letter airport or city code. Input is case-insensitive and stored
/// upper-case, the form every vendor expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IataCode(String);

impl IataCode {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(TripError::InvalidIata(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IataCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount in a named currency. The amount is always finite and
/// non-negative; sources that fail to parse degrade to zero upstream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

#[derive(Deserialize, Clone)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct TokenCache {
    token: OAuthTokenResponse,
    expiry: Instant,
}

static TOKEN_STORAGE: LazyLock<RwLock<Option<TokenCache>>> = LazyLock::new(|| RwLock::new(None));

/// Fetch an Amadeus OAuth bearer token, reusing a cached one while it has
/// at least 30 seconds of life left.
pub async fn get_bearer_token(client_id: &str, client_secret: &str) -> Result<String> {
    {
        let cache = TOKEN_STORAGE.read().await;
        if let Some(ref entry) = *cache {
            if entry.expiry > Instant::now() + Duration::from_secs(30) {
                return Ok(entry.token.access_token.clone());
            }
        }
    }

    let mut cache = TOKEN_STORAGE.write().await;

    // Another task may have refreshed while we waited for the write lock.
    if let Some(ref entry) = *cache {
        if entry.expiry > Instant::now() + Duration::from_secs(30) {
            return Ok(entry.token.access_token.clone());
        }
    }

    let params = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    log::debug!("requesting fresh Amadeus bearer token");
    let resp = reqwest::Client::new()
        .post(AMADEUS_AUTH_URL)
        .form(&params)
        .send()
        .await?
        .error_for_status()?;

    let token: OAuthTokenResponse = resp.json().await?;

    *cache = Some(TokenCache {
        token: token.clone(),
        expiry: Instant::now() + Duration::from_secs(token.expires_in),
    });

    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_accepts_leap_day() {
        assert!(Date::new(2024, 2, 29).is_ok());
    }

    #[test]
    fn date_rejects_impossible_days() {
        assert!(matches!(
            Date::new(2025, 2, 29),
            Err(TripError::InvalidDate(_))
        ));
        assert!(Date::new(2025, 4, 31).is_err());
        assert!(Date::new(2025, 13, 1).is_err());
        assert!(Date::new(2025, 0, 10).is_err());
        assert!(Date::new(2025, 6, 0).is_err());
    }

    #[test]
    fn date_formats_with_zero_padding() {
        let date = Date::new(2025, 6, 5).unwrap();
        assert_eq!(date.to_yyyy_mm_dd(), "2025-06-05");
    }

    #[test]
    fn date_parses_its_own_rendering() {
        let date = Date::from_yyyy_mm_dd("2025-06-15").unwrap();
        assert_eq!(date, Date::new(2025, 6, 15).unwrap());
        assert!(Date::from_yyyy_mm_dd("2025-06").is_err());
        assert!(Date::from_yyyy_mm_dd("2025-06-15-01").is_err());
        assert!(Date::from_yyyy_mm_dd("2025-xx-15").is_err());
    }

    #[test]
    fn iata_code_normalizes_case() {
        assert_eq!(IataCode::new("bcn").unwrap().as_str(), "BCN");
        assert_eq!(IataCode::new(" jfk ").unwrap().as_str(), "JFK");
    }

    #[test]
    fn iata_code_rejects_bad_input() {
        assert!(IataCode::new("BCNX").is_err());
        assert!(IataCode::new("B1N").is_err());
        assert!(IataCode::new("").is_err());
    }

    #[test]
    fn money_renders_two_decimals() {
        assert_eq!(Money::new(120.0, "EUR").to_string(), "120.00 EUR");
    }
}

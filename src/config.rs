use std::env;

/// Market, locale and currency defaults applied to every vendor search.
///
/// Threaded explicitly into each request builder so call sites never rely
/// on ambient globals. Defaults mirror the production deployment (Spanish
/// market, English locale, euro prices) and can be overridden through
/// `TRIPMATES_MARKET`, `TRIPMATES_LOCALE` and `TRIPMATES_CURRENCY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub market: String,
    pub locale: String,
    pub currency: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            market: "ES".to_string(),
            locale: "en-GB".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            market: env::var("TRIPMATES_MARKET").unwrap_or(defaults.market),
            locale: env::var("TRIPMATES_LOCALE").unwrap_or(defaults.locale),
            currency: env::var("TRIPMATES_CURRENCY").unwrap_or(defaults.currency),
        }
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TripError>;

#[derive(Error, Debug)]
pub enum TripError {
    /// A date component fell outside the calendar, caught before any
    /// request document is built.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid IATA code: {0}")]
    InvalidIata(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The vendor transport did not return a usable response: connection
    /// failure, non-2xx status or a body that failed to parse.
    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Email delivery failed: {0}")]
    EmailFailed(String),
}

impl From<reqwest::Error> for TripError {
    fn from(err: reqwest::Error) -> Self {
        Self::SearchFailed(err.to_string())
    }
}

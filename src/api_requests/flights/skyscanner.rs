use crate::api_requests::flights::query::{SearchRequest, build_query};
use crate::api_requests::flights::quotes::{FlightOption, RawQuoteGraph, normalize};
use crate::config::SearchConfig;
use crate::error::{Result, TripError};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::env;

const BASE_URL: &str =
    "https://partners.api.skyscanner.net/apiservices/v3/flights/indicative/search";

/// Response envelope around the quote graph. Both layers default so a
/// stripped-down body still parses to an empty graph instead of erroring.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndicativeSearchResponse {
    content: ResponseContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseContent {
    results: RawQuoteGraph,
}

impl IndicativeSearchResponse {
    pub fn into_results(self) -> RawQuoteGraph {
        self.content.results
    }
}

/// Run one indicative price search: build the request body, make a single
/// POST, normalize whatever comes back. Any transport problem surfaces as
/// one `SearchFailed`; the normalizer never sees a failed response.
pub async fn search_flights(
    request: &SearchRequest,
    config: &SearchConfig,
) -> Result<Vec<FlightOption>> {
    let api_key = env::var("SKYSCANNER_API_KEY")
        .map_err(|_| TripError::Config("SKYSCANNER_API_KEY not set".to_string()))?;

    let query = build_query(request, config);

    log::info!(
        "indicative flight search from {} to {}",
        request.origin,
        request
            .destination
            .as_ref()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "anywhere".to_string())
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
            "indicative search returned {status}: {body}"
        )));
    }

    let payload: IndicativeSearchResponse = resp.json().await?;
    Ok(normalize(&payload.into_results(), &config.currency))
}

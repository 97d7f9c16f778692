use crate::config::SearchConfig;
use crate::utils::{Date, IataCode};
use serde::Serialize;

const GROUPING_BY_DATE: &str = "DATE_TIME_GROUPING_TYPE_BY_DATE";
const GROUPING_BY_MONTH: &str = "DATE_TIME_GROUPING_TYPE_BY_MONTH";

/// How the traveller pinned down the outbound date, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    Fixed(Date),
    Range { start: Date, end: Date },
    Anytime,
}

/// One flight search as collected from the traveller. A missing
/// destination means "anywhere reachable from the origin" and is a valid
/// search, not an error.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub origin: IataCode,
    pub destination: Option<IataCode>,
    pub dates: DatePolicy,
    pub return_date: Option<Date>,
}

/// The indicative-search request body. Built fresh per request, purely
/// from its inputs: identical inputs serialize byte-identically.
#[derive(Debug, Serialize)]
pub struct QueryDocument {
    query: Query,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Query {
    market: String,
    locale: String,
    currency: String,
    query_legs: Vec<QueryLeg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time_grouping_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryLeg {
    origin_place: PlaceRef,
    destination_place: PlaceRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed_date: Option<DateParts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anytime: Option<bool>,
}

/// A leg endpoint: a concrete code, or the vendor's "anywhere" marker.
/// The marker is a dedicated key so it can never be confused with an
/// empty or placeholder IATA code.
#[derive(Debug, Serialize)]
enum PlaceRef {
    #[serde(rename = "queryPlace")]
    Query { iata: String },
    #[serde(rename = "anywhere")]
    Anywhere(bool),
}

impl PlaceRef {
    fn concrete(code: &IataCode) -> Self {
        Self::Query {
            iata: code.to_string(),
        }
    }
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DateRange {
    start_date: DateParts,
    end_date: DateParts,
}

/// Turn a search into the vendor request body. Pure data transformation:
/// dates were already validated at `Date` construction, so nothing here
/// can fail and no clock is consulted.
pub fn build_query(request: &SearchRequest, config: &SearchConfig) -> QueryDocument {
    let mut legs = vec![leg(
        PlaceRef::concrete(&request.origin),
        request
            .destination
            .as_ref()
            .map(PlaceRef::concrete)
            .unwrap_or(PlaceRef::Anywhere(true)),
        &request.dates,
    )];

    if let Some(return_date) = request.return_date {
        // A return leg needs a concrete airport to come back from, so
        // destination-less searches stay one-way.
        if let Some(destination) = &request.destination {
            legs.push(leg(
                PlaceRef::concrete(destination),
                PlaceRef::concrete(&request.origin),
                &DatePolicy::Fixed(return_date),
            ));
        } else {
            log::debug!("return date ignored for a search to anywhere");
        }
    }

    // Grouping is a document-level directive: anytime legs only make
    // sense bucketed by month, flexible ranges by date.
    let grouping = match request.dates {
        DatePolicy::Anytime => Some(GROUPING_BY_MONTH),
        DatePolicy::Range { .. } => Some(GROUPING_BY_DATE),
        DatePolicy::Fixed(_) => None,
    };

    QueryDocument {
        query: Query {
            market: config.market.clone(),
            locale: config.locale.clone(),
            currency: config.currency.clone(),
            query_legs: legs,
            date_time_grouping_type: grouping,
        },
    }
}

fn leg(origin: PlaceRef, destination: PlaceRef, dates: &DatePolicy) -> QueryLeg {
    let (fixed_date, date_range, anytime) = match dates {
        DatePolicy::Fixed(date) => (Some(DateParts::from(*date)), None, None),
        DatePolicy::Range { start, end } => (
            None,
            Some(DateRange {
                start_date: DateParts::from(*start),
                end_date: DateParts::from(*end),
            }),
            None,
        ),
        DatePolicy::Anytime => (None, None, Some(true)),
    };
    QueryLeg {
        origin_place: origin,
        destination_place: destination,
        fixed_date,
        date_range,
        anytime,
    }
}

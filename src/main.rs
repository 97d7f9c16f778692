mod api_requests;
mod config;
mod error;
mod utils;

use api_requests::cars::skyscanner::{CarHireRequest, render_car_table, search_car_hire};
use api_requests::email::{EmailMessage, send_email};
use api_requests::events::ticketmaster::{EventSearchRequest, render_event_table, search_events};
use api_requests::flights::query::{DatePolicy, SearchRequest};
use api_requests::flights::quotes::{cheapest, render_table};
use api_requests::flights::skyscanner::search_flights;
use api_requests::hotels::amadeus::{HotelSearchRequest, render_hotel_table, search_hotels};
use clap::{Parser, Subcommand};
use config::SearchConfig;
use error::{Result, TripError};
use utils::{Date, IataCode};

#[derive(Parser, Debug)]
#[command(name = "tripmates", about = "Trip planning searches from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Indicative flight prices between two airports, or from one airport
    /// to anywhere
    Flights {
        /// Origin airport IATA code, e.g. BCN
        origin: String,
        /// Destination airport IATA code; omit to search to anywhere
        destination: Option<String>,
        /// Departure date (YYYY-MM-DD); omit to search anytime
        #[arg(long)]
        date: Option<String>,
        /// Last acceptable departure date; together with --date forms a range
        #[arg(long)]
        until: Option<String>,
        /// Return date for a round trip
        #[arg(long)]
        return_date: Option<String>,
    },
    /// Indicative car hire prices at a location
    Cars {
        /// Vendor entity id of the pick-up/drop-off location
        location: String,
        #[arg(long)]
        pickup: String,
        #[arg(long)]
        dropoff: String,
    },
    /// Hotel offers in a city
    Hotels {
        /// City IATA code, e.g. BCN
        city: String,
        #[arg(long)]
        check_in: String,
        #[arg(long, default_value_t = 2)]
        adults: u8,
        #[arg(long, default_value_t = 15)]
        max_hotels: u8,
    },
    /// Events in a city around a date
    Events {
        city: String,
        #[arg(long)]
        date: String,
    },
    /// Email a trip summary
    Email {
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
    },
}

fn date_policy(date: Option<&str>, until: Option<&str>) -> Result<DatePolicy> {
    match (date, until) {
        (Some(date), None) => Ok(DatePolicy::Fixed(Date::from_yyyy_mm_dd(date)?)),
        (Some(start), Some(end)) => Ok(DatePolicy::Range {
            start: Date::from_yyyy_mm_dd(start)?,
            end: Date::from_yyyy_mm_dd(end)?,
        }),
        (None, None) => Ok(DatePolicy::Anytime),
        (None, Some(_)) => Err(TripError::InvalidDate(
            "--until only makes sense together with --date".to_string(),
        )),
    }
}

fn warn_degraded(count: usize) {
    if count > 0 {
        log::warn!("{count} option(s) had missing vendor data and carry sentinel values");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = SearchConfig::from_env();

    match args.command {
        Command::Flights {
            origin,
            destination,
            date,
            until,
            return_date,
        } => {
            let request = SearchRequest {
                origin: IataCode::new(&origin)?,
                destination: destination.as_deref().map(IataCode::new).transpose()?,
                dates: date_policy(date.as_deref(), until.as_deref())?,
                return_date: return_date.as_deref().map(Date::from_yyyy_mm_dd).transpose()?,
            };
            let options = search_flights(&request, &config).await?;
            warn_degraded(options.iter().filter(|option| option.degraded).count());
            println!("{}", render_table(&options));
            if let Some(best) = cheapest(&options) {
                let mut line = format!(
                    "Best price: {} to {} for {} with {} (quote {})",
                    best.origin, best.destination, best.price, best.carrier, best.quote_id
                );
                if let Some(return_date) = best.return_date {
                    line.push_str(&format!(", returning {return_date}"));
                }
                println!("\n{line}");
            }
        }
        Command::Cars {
            location,
            pickup,
            dropoff,
        } => {
            let request = CarHireRequest {
                location_entity_id: location,
                pickup: Date::from_yyyy_mm_dd(&pickup)?,
                dropoff: Date::from_yyyy_mm_dd(&dropoff)?,
            };
            let options = search_car_hire(&request, &config).await?;
            warn_degraded(options.iter().filter(|option| option.degraded).count());
            println!("{}", render_car_table(&options));
        }
        Command::Hotels {
            city,
            check_in,
            adults,
            max_hotels,
        } => {
            let request = HotelSearchRequest {
                city_code: IataCode::new(&city)?,
                check_in: Date::from_yyyy_mm_dd(&check_in)?,
                adults,
                max_hotels,
            };
            let offers = search_hotels(&request, &config).await?;
            warn_degraded(offers.iter().filter(|offer| offer.degraded).count());
            println!("{}", render_hotel_table(&offers));
        }
        Command::Events { city, date } => {
            let request = EventSearchRequest {
                city,
                date: Date::from_yyyy_mm_dd(&date)?,
            };
            let events = search_events(&request).await?;
            println!("{}", render_event_table(&events));
        }
        Command::Email { to, subject, body } => {
            send_email(&EmailMessage {
                to: to.clone(),
                subject,
                content: body,
            })
            .await?;
            println!("Trip summary sent to {to}.");
        }
    }

    Ok(())
}

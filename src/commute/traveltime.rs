use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::error::CommuteError;
use super::Coordinates;
use crate::config::TravelTimeConfig;

const SERVICE: &str = "TravelTime";
const SEARCH_ID: &str = "many-to-one";
const WORKPLACE_ID: &str = "workplace";

/// Longest commute the search accepts, in seconds (1h10)
const MAX_TRAVEL_TIME_SECS: u32 = 4200;

#[derive(Debug, Serialize)]
struct TimeFilterRequest<'a> {
    locations: Vec<Location<'a>>,
    arrival_searches: Vec<ArrivalSearch<'a>>,
}

#[derive(Debug, Serialize)]
struct Location<'a> {
    id: &'a str,
    coords: Coordinates,
}

#[derive(Debug, Serialize)]
struct ArrivalSearch<'a> {
    id: &'static str,
    departure_location_ids: Vec<&'a str>,
    arrival_location_id: &'static str,
    transportation: Transportation,
    arrival_time: String,
    range: Range,
    travel_time: u32,
    snapping: Snapping,
    properties: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct Transportation {
    #[serde(rename = "type")]
    kind: &'static str,
    pt_change_delay: u32,
    walking_time: u32,
    max_changes: MaxChanges,
}

#[derive(Debug, Serialize)]
struct MaxChanges {
    enabled: bool,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct Range {
    enabled: bool,
    max_results: u32,
    width: u32,
}

#[derive(Debug, Serialize)]
struct Snapping {
    threshold: u32,
}

#[derive(Debug, Deserialize)]
struct TimeFilterResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    locations: Vec<LocationResult>,
    #[serde(default)]
    unreachable: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocationResult {
    id: String,
    properties: Vec<LocationProperties>,
}

#[derive(Debug, Deserialize)]
struct LocationProperties {
    travel_time: u32,
}

/// Arrival at 11:00 Paris summer time on the given day
fn arrival_time(date: NaiveDate) -> String {
    format!("{}T11:00:00+02:00", date.format("%Y-%m-%d"))
}

/// Client for the TravelTime time-filter endpoint
#[derive(Clone)]
pub struct TravelTimeClient {
    client: Client,
    config: TravelTimeConfig,
}

impl TravelTimeClient {
    pub fn new(config: TravelTimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create TravelTime HTTP client")?;

        Ok(Self { client, config })
    }

    /// One batched public-transport query from every departure to the workplace.
    ///
    /// Returns minutes (rounded up) keyed by location id; unreachable locations
    /// are left out.
    pub async fn time_filter(
        &self,
        departures: &[(String, Coordinates)],
    ) -> Result<HashMap<String, u32>, CommuteError> {
        if departures.is_empty() {
            return Ok(HashMap::new());
        }

        let mut locations: Vec<Location> = departures
            .iter()
            .map(|(id, coords)| Location { id, coords: *coords })
            .collect();
        locations.push(Location {
            id: WORKPLACE_ID,
            coords: self.config.workplace.coords,
        });

        let request = TimeFilterRequest {
            locations,
            arrival_searches: vec![ArrivalSearch {
                id: SEARCH_ID,
                departure_location_ids: departures.iter().map(|(id, _)| id.as_str()).collect(),
                arrival_location_id: WORKPLACE_ID,
                transportation: Transportation {
                    kind: "train",
                    pt_change_delay: 120,
                    walking_time: 600,
                    max_changes: MaxChanges {
                        enabled: true,
                        limit: 2,
                    },
                },
                arrival_time: arrival_time(Utc::now().date_naive()),
                range: Range {
                    enabled: true,
                    max_results: 1,
                    width: 3600,
                },
                travel_time: MAX_TRAVEL_TIME_SECS,
                snapping: Snapping { threshold: 200 },
                properties: vec!["travel_time"],
            }],
        };

        let url = format!("{}/v4/time-filter", self.config.base_url);
        info!("Requesting travel times for {} locations", departures.len());

        let response = self
            .client
            .post(&url)
            .header("X-Application-Id", &self.config.app_id)
            .header("X-Api-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(CommuteError::http(SERVICE))?;

        let body: TimeFilterResponse = CommuteError::check(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(CommuteError::http(SERVICE))?;

        let mut minutes = HashMap::new();
        for result in body.results {
            if !result.unreachable.is_empty() {
                debug!("Unreachable within range: {:?}", result.unreachable);
            }
            for location in result.locations {
                if let Some(props) = location.properties.first() {
                    minutes.insert(location.id, props.travel_time.div_ceil(60));
                }
            }
        }

        Ok(minutes)
    }
}

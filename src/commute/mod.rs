pub mod error;
pub mod geocoding;
pub mod traveltime;

pub use error::CommuteError;
pub use geocoding::GeocodingClient;
pub use traveltime::TravelTimeClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{CommuteTime, ListingRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Source of commute times for a set of addresses
#[async_trait]
pub trait CommuteLookup: Send + Sync {
    /// Minutes to the workplace per address; addresses that could not be
    /// resolved are absent from the map
    async fn commute_times(&self, addresses: &[String]) -> HashMap<String, u32>;
}

/// Geocodes each address, then asks TravelTime for all of them in one query
pub struct CommuteService {
    geocoder: GeocodingClient,
    travel_time: TravelTimeClient,
}

impl CommuteService {
    pub fn new(geocoder: GeocodingClient, travel_time: TravelTimeClient) -> Self {
        Self {
            geocoder,
            travel_time,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            GeocodingClient::new(config.geocoding_base_url.clone())?,
            TravelTimeClient::new(config.travel_time.clone())?,
        ))
    }
}

#[async_trait]
impl CommuteLookup for CommuteService {
    async fn commute_times(&self, addresses: &[String]) -> HashMap<String, u32> {
        let mut seen = HashSet::new();
        let mut departures = Vec::new();

        for address in addresses {
            if !seen.insert(address.as_str()) {
                continue;
            }
            match self.geocoder.geocode(address).await {
                Ok(coords) => departures.push((address.clone(), coords)),
                Err(e) => warn!(address = %address, error = %e, "Skipping address"),
            }
        }

        info!(
            "Geocoded {} of {} unique addresses",
            departures.len(),
            seen.len()
        );

        match self.travel_time.time_filter(&departures).await {
            Ok(minutes) => minutes,
            Err(e) => {
                warn!(error = %e, "Travel time lookup failed, all commutes unknown");
                HashMap::new()
            }
        }
    }
}

/// Attach commute times by exact address match; anything missing becomes `Unknown`
pub fn merge_commute_times(records: &mut [ListingRecord], minutes: &HashMap<String, u32>) {
    for record in records {
        record.commute_time = Some(match minutes.get(&record.address) {
            Some(&m) => CommuteTime::Minutes(m),
            None => CommuteTime::Unknown,
        });
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extraction::ListingFeatureExtractor;

/// Placeholder for a size or price that could not be read from the page
pub const UNPARSED: f64 = -1.0;

/// Placeholder for a listing that does not state its floor
pub const FLOOR_UNSPECIFIED: i32 = -1;

/// Fields captured from one offer page, before any feature parsing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    pub reference: Option<String>,
    pub address: String,
    pub size: f64,
    pub price: f64,
    pub energy_rating: Option<String>,
    pub emission_rating: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
}

/// Commute time to the workplace once the lookup has run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommuteTime {
    Minutes(u32),
    /// Address could not be geocoded or is out of the travel-time range
    Unknown,
}

impl fmt::Display for CommuteTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommuteTime::Minutes(minutes) => write!(f, "{}m", minutes),
            CommuteTime::Unknown => f.write_str(">10m walk or >70"),
        }
    }
}

/// One rental listing with its structured fields derived from the feature list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    pub reference: Option<String>,
    pub address: String,
    /// Square meters, `UNPARSED` when the page value was unreadable
    pub size: f64,
    /// Monthly rent with charges, `UNPARSED` when unreadable
    pub price: f64,
    pub energy_rating: Option<String>,
    pub emission_rating: Option<String>,
    pub description: Option<String>,
    /// Feature strings no extraction rule recognized
    pub features: Vec<String>,
    pub commute_time: Option<CommuteTime>,
    /// `None` until a feature string mentions the elevator
    pub has_elevator: Option<bool>,
    pub floor: i32,
    pub bedroom_count: u32,
    pub concierge_included: bool,
    pub hot_water_included: bool,
    pub cold_water_included: bool,
    pub heating_included: bool,
    pub is_new_building: bool,
}

impl ListingRecord {
    /// Build a record from scraped fields, consuming every recognized feature string
    pub fn from_raw(raw: RawListing) -> Self {
        let mut record = Self {
            reference: raw.reference,
            address: raw.address,
            size: raw.size,
            price: raw.price,
            energy_rating: raw.energy_rating,
            emission_rating: raw.emission_rating,
            description: raw.description,
            features: raw.features,
            commute_time: None,
            has_elevator: None,
            floor: FLOOR_UNSPECIFIED,
            bedroom_count: 0,
            concierge_included: false,
            hot_water_included: false,
            cold_water_included: false,
            heating_included: false,
            is_new_building: false,
        };

        ListingFeatureExtractor::apply(&mut record);
        record
    }
}

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::error::CommuteError;
use super::Coordinates;

const SERVICE: &str = "Geocoding";

/// GeoJSON response of the national address search API
#[derive(Debug, Deserialize)]
struct SearchResponse {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: longitude first
    coordinates: [f64; 2],
}

/// Client for `api-adresse.data.gouv.fr`-compatible address search
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("logement-scout/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create geocoding HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an address to the coordinates of its best match
    #[instrument(skip(self))]
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, CommuteError> {
        let url = format!("{}/search/", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("limit", "1")])
            .send()
            .await
            .map_err(CommuteError::http(SERVICE))?;

        let body: SearchResponse = CommuteError::check(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(CommuteError::http(SERVICE))?;

        let feature = body
            .features
            .into_iter()
            .next()
            .ok_or_else(|| CommuteError::NoResult(address.to_string()))?;
        let [lng, lat] = feature.geometry.coordinates;

        debug!("Geocoded {} → ({}, {})", address, lat, lng);

        Ok(Coordinates { lat, lng })
    }
}

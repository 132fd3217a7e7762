use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::commute::Coordinates;

const DEFAULT_WORKPLACE_LABEL: &str = "EPEX SPOT Paris";
const DEFAULT_WORKPLACE_LAT: f64 = 48.8714463;
const DEFAULT_WORKPLACE_LNG: f64 = 2.3423495;
const DEFAULT_GEOCODING_BASE_URL: &str = "https://api-adresse.data.gouv.fr";
const DEFAULT_TRAVELTIME_BASE_URL: &str = "https://api.traveltimeapp.com";

/// Login for the Action Logement portal
#[derive(Clone)]
pub struct PortalCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Destination every commute is measured against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workplace {
    /// Shown as the route origin in the report
    pub label: String,
    pub coords: Coordinates,
}

#[derive(Debug, Clone)]
pub struct TravelTimeConfig {
    pub app_id: String,
    pub api_key: String,
    pub base_url: String,
    pub workplace: Workplace,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub portal: PortalCredentials,
    pub travel_time: TravelTimeConfig,
    pub geocoding_base_url: String,
    pub headless: bool,
}

impl Config {
    /// Load configuration from the process environment (and `.env` when present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let travel_time = TravelTimeConfig {
            app_id: required(&lookup, "TRAVELTIME_APP_ID")?,
            api_key: required(&lookup, "TRAVELTIME_API_KEY")?,
            base_url: base_url(&lookup, "TRAVELTIME_BASE_URL", DEFAULT_TRAVELTIME_BASE_URL)?,
            workplace: Workplace {
                label: lookup("WORKPLACE_LABEL")
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_WORKPLACE_LABEL.to_string()),
                coords: Coordinates {
                    lat: optional(&lookup, "WORKPLACE_LAT", DEFAULT_WORKPLACE_LAT)?,
                    lng: optional(&lookup, "WORKPLACE_LNG", DEFAULT_WORKPLACE_LNG)?,
                },
            },
        };

        let config = Self {
            portal: PortalCredentials {
                email: required(&lookup, "ACTIONLOGEMENT_EMAIL")?,
                password: required(&lookup, "ACTIONLOGEMENT_PASSWORD")?,
            },
            travel_time,
            geocoding_base_url: base_url(
                &lookup,
                "GEOCODING_BASE_URL",
                DEFAULT_GEOCODING_BASE_URL,
            )?,
            headless: optional(&lookup, "HEADLESS", true)?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Workplace: {}", config.travel_time.workplace.label);
        tracing::debug!("Geocoding base URL: {}", config.geocoding_base_url);
        tracing::debug!("TravelTime base URL: {}", config.travel_time.base_url);

        Ok(config)
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        bail!("{} cannot be empty", name);
    }
    Ok(value)
}

fn optional<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name).filter(|s| !s.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, value)),
        None => Ok(default),
    }
}

fn base_url<F>(lookup: &F, name: &str, default: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let url = lookup(name)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("TRAVELTIME_APP_ID", "app"),
        ("TRAVELTIME_API_KEY", "key"),
        ("ACTIONLOGEMENT_EMAIL", "me@example.com"),
        ("ACTIONLOGEMENT_PASSWORD", "secret"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();

        assert_eq!(config.travel_time.app_id, "app");
        assert_eq!(config.travel_time.workplace.label, DEFAULT_WORKPLACE_LABEL);
        assert_eq!(config.travel_time.workplace.coords.lat, DEFAULT_WORKPLACE_LAT);
        assert_eq!(config.travel_time.base_url, DEFAULT_TRAVELTIME_BASE_URL);
        assert_eq!(config.geocoding_base_url, DEFAULT_GEOCODING_BASE_URL);
        assert!(config.headless);
    }

    #[test]
    fn test_missing_travel_time_key_is_fatal() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "TRAVELTIME_API_KEY")
            .collect();
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("TRAVELTIME_API_KEY"));
    }

    #[test]
    fn test_empty_value_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("TRAVELTIME_APP_ID", "  "));
        // later entries win in the map
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend_from_slice(&[
            ("WORKPLACE_LABEL", "La Défense"),
            ("WORKPLACE_LAT", "48.8918"),
            ("HEADLESS", "false"),
            ("GEOCODING_BASE_URL", "http://localhost:9000/"),
        ]);
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.travel_time.workplace.label, "La Défense");
        assert_eq!(config.travel_time.workplace.coords.lat, 48.8918);
        assert!(!config.headless);
        assert_eq!(config.geocoding_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("WORKPLACE_LNG", "east"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert!(!format!("{:?}", config).contains("secret"));
    }
}

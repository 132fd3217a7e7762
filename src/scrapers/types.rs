use serde::{Deserialize, Serialize};

/// Search form choices on the Action Logement portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Radius option label around Paris
    pub radius: String,
    /// Rental type option label
    pub rental_type: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            radius: "0 km".to_string(),
            rental_type: "Location classique".to_string(),
        }
    }
}

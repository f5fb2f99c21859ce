use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for the debug search endpoint
///
/// `location` is a `"lat,lng"` pair, as the places API expects it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[serde(default = "default_location")]
    #[validate(length(min = 3))]
    pub location: String,
    #[validate(range(min = 1, max = 50000))]
    pub radius: Option<u32>,
    pub keyword: Option<String>,
}

fn default_location() -> String {
    "25.0478,121.5319".to_string()
}

impl SearchRequest {
    /// Split `location` into coordinates
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let (lat, lng) = self.location.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Some((lat, lng))
        } else {
            None
        }
    }
}

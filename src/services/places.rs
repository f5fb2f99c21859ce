use crate::models::PlaceCandidate;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const NEARBY_SEARCH_PATH: &str = "/maps/api/place/nearbysearch/json";

/// Errors that can occur when querying the places API
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Nearby-search query
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: u32,
    pub keyword: Option<String>,
}

/// Anything that can list restaurants around a point
#[async_trait]
pub trait NearbySearch: Send + Sync {
    async fn nearby_restaurants(&self, request: &NearbyRequest) -> Result<Vec<PlaceCandidate>, PlacesError>;
}

/// Google Places nearby-search client
pub struct PlacesClient {
    base_url: String,
    api_key: String,
    language: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    vicinity: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    price_level: Option<u8>,
    #[serde(default)]
    photos: Vec<PlacePhoto>,
    geometry: PlaceGeometry,
}

#[derive(Debug, Deserialize)]
struct PlacePhoto {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct PlaceGeometry {
    location: PlaceLocation,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    lat: f64,
    lng: f64,
}

impl From<PlaceResult> for PlaceCandidate {
    fn from(result: PlaceResult) -> Self {
        PlaceCandidate {
            name: result.name,
            address: result.vicinity,
            rating: result.rating,
            rating_count: result.user_ratings_total,
            price_level: result.price_level,
            photo_reference: result.photos.into_iter().next().map(|p| p.photo_reference),
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }
    }
}

impl PlacesClient {
    pub fn new(
        base_url: String,
        api_key: String,
        language: String,
        timeout_secs: u64,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            language,
            client,
        })
    }

    /// Parse a nearby-search response body; malformed entries are skipped
    pub fn parse_response(json: &Value) -> Result<Vec<PlaceCandidate>, PlacesError> {
        let status = json.get("status").and_then(|s| s.as_str()).unwrap_or("OK");
        match status {
            "OK" | "ZERO_RESULTS" => {}
            other => {
                let detail = json
                    .get("error_message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("no error message");
                return Err(PlacesError::ApiError(format!("{}: {}", other, detail)));
            }
        }

        let results = json
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| PlacesError::InvalidResponse("Missing results array".into()))?;

        let places = results
            .iter()
            .filter_map(|item| match serde_json::from_value::<PlaceResult>(item.clone()) {
                Ok(place) => Some(PlaceCandidate::from(place)),
                Err(e) => {
                    tracing::debug!("Skipping malformed place entry: {}", e);
                    None
                }
            })
            .collect();

        Ok(places)
    }
}

#[async_trait]
impl NearbySearch for PlacesClient {
    async fn nearby_restaurants(&self, request: &NearbyRequest) -> Result<Vec<PlaceCandidate>, PlacesError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), NEARBY_SEARCH_PATH);

        let mut query = vec![
            ("location", format!("{},{}", request.latitude, request.longitude)),
            ("radius", request.radius_m.to_string()),
            ("type", "restaurant".to_string()),
            ("language", self.language.clone()),
            ("key", self.api_key.clone()),
        ];
        if let Some(keyword) = request.keyword.as_deref().filter(|k| !k.is_empty()) {
            query.push(("keyword", keyword.to_string()));
        }

        tracing::debug!(
            radius = request.radius_m,
            keyword = ?request.keyword,
            "Querying nearby restaurants"
        );

        let response = self.client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            return Err(PlacesError::ApiError(format!(
                "Nearby search failed: {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| PlacesError::InvalidResponse(e.to_string()))?;

        let places = Self::parse_response(&json)?;
        tracing::debug!("Nearby search returned {} places", places.len());
        Ok(places)
    }
}

//! Contracts for the upstream geocoding and forecast providers.
//!
//! The resolver and the forecast cache only see these traits, so they can be
//! exercised without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::GeocodeError;

/// One hour of forecast, as stored in a location's cached payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastPoint {
    /// Start of the hour, epoch milliseconds
    pub date: i64,
    /// Icon URL for the hour's conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Temperature in Fahrenheit
    pub temp: i32,
    /// Temperature in Celsius
    pub temp_c: i32,
    /// Probability of precipitation, percent
    #[serde(default)]
    pub pop: i32,
    /// Feels-like temperature in Fahrenheit
    #[serde(default)]
    pub feel: i32,
    /// Feels-like temperature in Celsius
    #[serde(default)]
    pub feel_c: i32,
}

/// A successful geocoding result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeMatch {
    /// Provider query path used for forecast fetches.
    pub url: String,
    /// Display name, e.g. "Paris, France".
    pub name: String,
    /// Stable provider identity key.
    pub zmw: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve free-form user input to a provider location.
    async fn geocode(&self, raw_input: &str) -> Result<GeocodeMatch, GeocodeError>;
}

#[async_trait]
pub trait ForecastFetcher: Send + Sync {
    /// Fetch the hourly forecast for a provider query path.
    ///
    /// Returns an empty sequence, never an error, when upstream has nothing
    /// usable.
    async fn fetch(&self, query_path: &str, api_key: &str) -> Vec<ForecastPoint>;
}

/// Serialize a forecast for storage in a location's cache column.
pub fn encode_payload(points: &[ForecastPoint]) -> String {
    serde_json::to_string(points).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize forecast payload: {}", e);
        String::from("[]")
    })
}

/// Deserialize a stored payload. Empty or malformed payloads read as no data.
pub fn decode_payload(payload: &str) -> Vec<ForecastPoint> {
    if payload.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(payload).unwrap_or_else(|e| {
        tracing::warn!("Discarding malformed cached forecast payload: {}", e);
        Vec::new()
    })
}

//! Per-location forecast cache.
//!
//! A location's serialized forecast is reused while it is non-empty and at
//! most [`FORECAST_TTL_SECS`] old. Otherwise the upstream provider is asked
//! again. Every call, hit or miss, writes the location back through the
//! record store and appends one lookup history entry.

use chrono::{DateTime, Utc};

use crate::db::models::Location;
use crate::db::store::RecordStore;
use crate::errors::AppError;
use crate::helpers::at_most;
use crate::services::upstream::{decode_payload, encode_payload, ForecastFetcher, ForecastPoint};

/// Maximum age of a cached forecast before it is fetched again (45 minutes).
pub const FORECAST_TTL_SECS: i64 = 2700;

/// A forecast together with the stored location it belongs to.
#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub location: Location,
    pub points: Vec<ForecastPoint>,
    /// Whether the forecast came from the cache without an upstream call.
    pub from_cache: bool,
}

/// Forecast cache bound to a record store and an upstream fetcher.
pub struct WeatherCache<'a> {
    store: &'a dyn RecordStore,
    fetcher: &'a dyn ForecastFetcher,
    api_key: &'a str,
}

impl<'a> WeatherCache<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        fetcher: &'a dyn ForecastFetcher,
        api_key: &'a str,
    ) -> Self {
        Self {
            store,
            fetcher,
            api_key,
        }
    }

    /// Return the forecast for `location`, refreshing it when stale, and
    /// record that `normalized_input` resolved to it.
    pub async fn get_forecast(
        &self,
        mut location: Location,
        normalized_input: &str,
        now: DateTime<Utc>,
    ) -> Result<CachedForecast, AppError> {
        let cached = decode_payload(&location.cache);
        let fresh = !cached.is_empty()
            && location
                .last_updated
                .is_some_and(|at| at_most(at, now, FORECAST_TTL_SECS));

        if fresh {
            tracing::info!("Weather for {} was recently cached, reusing", location.zmw);
        } else {
            tracing::info!("Using weather API for {}", location.zmw);
            let points = self.fetcher.fetch(&location.url, self.api_key).await;
            location.cache = encode_payload(&points);
            if points.is_empty() {
                // Keep last_updated so the next request retries.
                tracing::warn!("Didn't get any results from weather API for {}", location.zmw);
            } else {
                location.last_updated = Some(now);
            }
        }

        let location = self.store.upsert_location(&location).await?;
        self.record_lookup(normalized_input, &location, now).await?;

        Ok(CachedForecast {
            points: decode_payload(&location.cache),
            location,
            from_cache: fresh,
        })
    }

    /// Append a lookup history entry linking `normalized_input` to `location`.
    pub async fn record_lookup(
        &self,
        normalized_input: &str,
        location: &Location,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.store
            .append_lookup(normalized_input, location, now)
            .await?;
        Ok(())
    }
}

//! One resolution cycle per request.
//!
//! Merges the client's previous state with the request's overrides, then
//! runs location resolution, the forecast cache and the temperature summary
//! in that order. Recoverable problems become [`CycleWarning`]s and a default
//! value; only record store failures abort the cycle.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::db::models::Location;
use crate::db::store::RecordStore;
use crate::errors::{AppError, CycleWarning};
use crate::services::forecast::WeatherCache;
use crate::services::resolver;
use crate::services::session::{RequestState, SessionStore};
use crate::services::temperatures::{summarize, TemperatureSummary, Units, DEFAULT_NUM_HOURS};
use crate::services::upstream::{ForecastFetcher, ForecastPoint, Geocoder};

/// Per-request overrides, all optional.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RequestOverrides {
    /// Free-form location: city, zip code, airport...
    pub user_input: Option<String>,
    /// Switch units, "F" or "C"; anything else is ignored
    pub new_units: Option<String>,
    /// Number of forecast hours to show
    pub num_hours: Option<String>,
}

/// The collaborators a cycle runs against.
pub struct CycleDeps<'a> {
    pub store: &'a dyn RecordStore,
    pub geocoder: &'a dyn Geocoder,
    pub fetcher: &'a dyn ForecastFetcher,
    pub api_key: &'a str,
}

/// Everything a request produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// State to carry into the client's next request.
    pub state: RequestState,
    pub location: Location,
    pub forecast: Vec<ForecastPoint>,
    pub summary: TemperatureSummary,
    pub warnings: Vec<CycleWarning>,
}

/// Apply a units override when it is a known unit different from `prior`.
pub fn effective_units(prior: Units, requested: Option<&str>) -> Units {
    match requested.and_then(|s| s.parse::<Units>().ok()) {
        Some(units) if units != prior => units,
        _ => prior,
    }
}

/// Parse an hours override, falling back to [`DEFAULT_NUM_HOURS`] with a
/// warning when it is not an integer.
pub fn effective_hours(prior: i64, requested: Option<&str>) -> (i64, Option<CycleWarning>) {
    let Some(raw) = requested else {
        return (prior, None);
    };
    match raw.trim().parse::<i64>() {
        Ok(hours) => (hours, None),
        Err(_) => {
            tracing::error!("Bad number of hours: {:?}", raw);
            (
                DEFAULT_NUM_HOURS,
                Some(CycleWarning::ParameterFailure {
                    value: raw.to_string(),
                }),
            )
        }
    }
}

/// Run one cycle from an explicit prior state.
pub async fn run_cycle(
    deps: &CycleDeps<'_>,
    prior: RequestState,
    overrides: &RequestOverrides,
    now: DateTime<Utc>,
) -> Result<CycleOutcome, AppError> {
    tracing::info!("STARTING");
    let mut warnings = Vec::new();

    let units = effective_units(prior.units, overrides.new_units.as_deref());
    tracing::info!("Units: {}", units);

    let (num_hours, hours_warning) =
        effective_hours(prior.num_hours, overrides.num_hours.as_deref());
    warnings.extend(hours_warning);

    let raw_input = overrides
        .user_input
        .clone()
        .unwrap_or(prior.user_input);
    let resolution = resolver::resolve(deps.store, deps.geocoder, &raw_input, now).await?;
    warnings.extend(resolution.warning);

    let cache = WeatherCache::new(deps.store, deps.fetcher, deps.api_key);
    let cached = cache
        .get_forecast(resolution.location, &resolution.normalized_input, now)
        .await?;

    tracing::debug!(
        "Forecast for {} ({} points, from cache: {})",
        cached.location.zmw,
        cached.points.len(),
        cached.from_cache
    );
    let summary = summarize(&cached.points, num_hours, units);

    let state = RequestState {
        units,
        user_input: resolution.normalized_input,
        num_hours,
    };
    tracing::info!("FINISHED with {}", state.user_input);

    Ok(CycleOutcome {
        state,
        location: cached.location,
        forecast: cached.points,
        summary,
        warnings,
    })
}

/// Run one cycle for a client, loading and persisting its session state.
pub async fn run_session_cycle(
    deps: &CycleDeps<'_>,
    sessions: &dyn SessionStore,
    client_id: Uuid,
    overrides: &RequestOverrides,
    now: DateTime<Utc>,
) -> Result<CycleOutcome, AppError> {
    let prior = sessions.load(client_id).await.unwrap_or_default();
    let outcome = run_cycle(deps, prior, overrides, now).await?;
    sessions.save(client_id, outcome.state.clone()).await;
    Ok(outcome)
}

//! Weather HTTP endpoints.
//!
//! - GET /?user_input=..&new_units=F|C&num_hours=N
//! - GET /fake

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::store::PgStore;
use crate::errors::{AppError, CycleWarning, ErrorResponse};
use crate::helpers::{session_cookie, session_id_from_headers};
use crate::services::cycle::{run_session_cycle, CycleDeps, CycleOutcome, RequestOverrides};
use crate::services::session::{MemorySessionStore, RequestState};
use crate::services::temperatures::{window, Units};
use crate::services::upstream::ForecastPoint;
use crate::services::wunderground::WundergroundClient;

/// Shared application state for weather endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: PgStore,
    pub(crate) client: WundergroundClient,
    pub(crate) sessions: MemorySessionStore,
    pub(crate) api_key: String,
    pub(crate) session_cookie: String,
}

/// A non-fatal problem to show the user.
#[derive(Debug, Serialize, ToSchema)]
pub struct WarningMessage {
    /// "resolution_failure" or "parameter_failure"
    pub kind: String,
    /// The request value that was rejected
    pub rejected: String,
    /// Human-readable message
    pub message: String,
}

impl From<&CycleWarning> for WarningMessage {
    fn from(w: &CycleWarning) -> Self {
        let (kind, rejected) = match w {
            CycleWarning::ResolutionFailure { input } => ("resolution_failure", input),
            CycleWarning::ParameterFailure { value } => ("parameter_failure", value),
        };
        Self {
            kind: kind.to_string(),
            rejected: rejected.clone(),
            message: w.to_string(),
        }
    }
}

/// Forecast page data.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    /// Preferences that will be used for the next request
    pub state: RequestState,
    /// Provider identity of the resolved location
    pub location_id: String,
    /// Display name of the resolved location
    pub location_name: String,
    /// Current temperature in the selected units
    pub current_temp: Option<i32>,
    /// Highest temperature over the next `num_hours`
    pub max_temp: Option<i32>,
    /// Lowest temperature over the next `num_hours`
    pub min_temp: Option<i32>,
    /// Icon for the current hour
    pub icon: Option<String>,
    /// The first `num_hours` forecast points
    pub forecast: Vec<ForecastPoint>,
    pub warnings: Vec<WarningMessage>,
}

impl WeatherResponse {
    fn from_outcome(outcome: CycleOutcome) -> Self {
        let forecast = window(&outcome.forecast, outcome.state.num_hours).to_vec();
        Self {
            location_id: outcome.location.zmw,
            location_name: outcome.location.name,
            current_temp: outcome.summary.current,
            max_temp: outcome.summary.max,
            min_temp: outcome.summary.min,
            icon: outcome.summary.icon,
            forecast,
            warnings: outcome.warnings.iter().map(WarningMessage::from).collect(),
            state: outcome.state,
        }
    }
}

/// Resolve the requested location and return its forecast summary.
///
/// Missing parameters fall back to the client's previous request, identified
/// by the session cookie. A new cookie is issued when none is present.
#[utoipa::path(
    get,
    path = "/",
    tag = "Weather",
    params(RequestOverrides),
    responses(
        (status = 200, description = "Forecast for the resolved location", body = WeatherResponse),
        (status = 500, description = "Record store unavailable", body = ErrorResponse),
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(overrides): Query<RequestOverrides>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<WeatherResponse>), AppError> {
    let existing = session_id_from_headers(&headers, &state.session_cookie);
    let client_id = existing.unwrap_or_else(Uuid::new_v4);

    let deps = CycleDeps {
        store: &state.store,
        geocoder: &state.client,
        fetcher: &state.client,
        api_key: &state.api_key,
    };
    let outcome =
        run_session_cycle(&deps, &state.sessions, client_id, &overrides, Utc::now()).await?;

    let mut response_headers = HeaderMap::new();
    if existing.is_none() {
        let cookie = session_cookie(&state.session_cookie, client_id);
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::InternalError(format!("Invalid session cookie: {}", e)))?;
        response_headers.insert(SET_COOKIE, value);
    }

    Ok((response_headers, Json(WeatherResponse::from_outcome(outcome))))
}

/// Canned forecast for front-end work. Touches neither upstream nor the store.
#[utoipa::path(
    get,
    path = "/fake",
    tag = "Weather",
    responses(
        (status = 200, description = "Fixed sample forecast", body = WeatherResponse),
    )
)]
pub async fn get_fake_weather() -> Json<WeatherResponse> {
    Json(fake_response())
}

fn fake_response() -> WeatherResponse {
    const PARTLY_CLOUDY: &str = "http://icons.wxug.com/i/c/k/partlycloudy.gif";
    const CLEAR: &str = "http://icons.wxug.com/i/c/k/clear.gif";
    const NIGHT_CLEAR: &str = "http://icons.wxug.com/i/c/k/nt_clear.gif";

    let hours: [(&str, i32, i32); 12] = [
        (PARTLY_CLOUDY, 66, 15),
        (PARTLY_CLOUDY, 67, 15),
        (PARTLY_CLOUDY, 67, 15),
        (PARTLY_CLOUDY, 68, 15),
        (CLEAR, 66, 0),
        (CLEAR, 64, 0),
        (NIGHT_CLEAR, 62, 0),
        (NIGHT_CLEAR, 61, 0),
        (NIGHT_CLEAR, 59, 0),
        (NIGHT_CLEAR, 58, 0),
        (NIGHT_CLEAR, 55, 0),
        (NIGHT_CLEAR, 53, 0),
    ];
    let forecast = hours
        .iter()
        .zip(0i64..)
        .map(|(&(icon, temp, pop), i)| ForecastPoint {
            date: 1_461_434_400_000 + i * 3_600_000,
            icon: Some(icon.to_string()),
            temp,
            temp_c: (temp - 32) * 5 / 9,
            pop,
            feel: temp,
            feel_c: (temp - 32) * 5 / 9,
        })
        .collect();

    WeatherResponse {
        state: RequestState {
            units: Units::F,
            user_input: "chilled".to_string(),
            num_hours: 12,
        },
        location_id: String::new(),
        location_name: "10027 -- New York, NY".to_string(),
        current_temp: Some(75),
        max_temp: Some(80),
        min_temp: Some(65),
        icon: Some(NIGHT_CLEAR.to_string()),
        forecast,
        warnings: Vec::new(),
    }
}

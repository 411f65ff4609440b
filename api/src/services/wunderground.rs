//! Weather Underground client.
//!
//! Implements both upstream contracts: location autocomplete (geocoding) and
//! the hourly forecast for a provider query path such as
//! `/q/zmw:10027.1.99999`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{AppError, GeocodeError};
use crate::services::upstream::{ForecastFetcher, ForecastPoint, GeocodeMatch, Geocoder};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the Weather Underground autocomplete and hourly APIs.
#[derive(Debug, Clone)]
pub struct WundergroundClient {
    client: reqwest::Client,
    weather_base_url: String,
    autocomplete_base_url: String,
}

// --- Autocomplete JSON response types ---

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(rename = "RESULTS", default)]
    results: Vec<AutocompleteResult>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResult {
    name: Option<String>,
    zmw: Option<String>,
    /// Query path for the forecast API.
    l: Option<String>,
}

// --- Hourly forecast JSON response types ---

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    #[serde(default)]
    hourly_forecast: Vec<HourlyEntry>,
}

#[derive(Debug, Deserialize)]
struct HourlyEntry {
    #[serde(rename = "FCTTIME")]
    fcttime: FctTime,
    temp: Option<DualUnit>,
    feelslike: Option<DualUnit>,
    icon_url: Option<String>,
    pop: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct FctTime {
    epoch: Scalar,
}

#[derive(Debug, Deserialize)]
struct DualUnit {
    english: Scalar,
    metric: Scalar,
}

/// Weather Underground quotes most numbers as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Num(f64),
    Str(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Num(n) => Some(*n),
            Scalar::Str(s) => s.trim().parse().ok(),
        }
    }

    fn as_i32(&self) -> Option<i32> {
        self.as_f64().map(|v| v.round() as i32)
    }
}

impl WundergroundClient {
    pub fn new(weather_base_url: &str, autocomplete_base_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            weather_base_url: weather_base_url.trim_end_matches('/').to_string(),
            autocomplete_base_url: autocomplete_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_hourly(
        &self,
        query_path: &str,
        api_key: &str,
    ) -> Result<Vec<ForecastPoint>, AppError> {
        let url = format!(
            "{}/api/{}/hourly{}.json",
            self.weather_base_url, api_key, query_path
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("hourly request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "hourly API returned HTTP {}",
                response.status()
            )));
        }

        let body: HourlyResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("hourly JSON parse error: {}", e))
            })?;

        Ok(parse_hourly(body))
    }
}

/// Convert hourly entries to forecast points, dropping hours without a
/// usable timestamp or temperature.
fn parse_hourly(body: HourlyResponse) -> Vec<ForecastPoint> {
    body.hourly_forecast
        .into_iter()
        .filter_map(|entry| {
            let epoch = entry.fcttime.epoch.as_f64()? as i64;
            let temp = entry.temp.as_ref()?;
            let (temp_f, temp_c) = (temp.english.as_i32()?, temp.metric.as_i32()?);
            let (feel, feel_c) = entry
                .feelslike
                .as_ref()
                .and_then(|f| Some((f.english.as_i32()?, f.metric.as_i32()?)))
                .unwrap_or((temp_f, temp_c));
            Some(ForecastPoint {
                date: epoch * 1000,
                icon: entry.icon_url.filter(|s| !s.is_empty()),
                temp: temp_f,
                temp_c,
                pop: entry.pop.as_ref().and_then(Scalar::as_i32).unwrap_or(0),
                feel,
                feel_c,
            })
        })
        .collect()
}

/// Pick the first autocomplete result that carries a query path and id.
fn first_match(raw_input: &str, body: AutocompleteResponse) -> Result<GeocodeMatch, GeocodeError> {
    let first = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(raw_input.to_string()))?;

    match (first.l, first.zmw) {
        (Some(url), Some(zmw)) if !url.is_empty() && !zmw.is_empty() => Ok(GeocodeMatch {
            url,
            name: first.name.unwrap_or_default(),
            zmw,
        }),
        _ => Err(GeocodeError::Parse(format!(
            "result for {:?} is missing its query path or id",
            raw_input
        ))),
    }
}

#[async_trait]
impl Geocoder for WundergroundClient {
    async fn geocode(&self, raw_input: &str) -> Result<GeocodeMatch, GeocodeError> {
        let query = raw_input.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound(raw_input.to_string()));
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{}/aq", self.autocomplete_base_url),
            &[("query", query)],
        )
        .map_err(|e| GeocodeError::Request(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Request(format!(
                "autocomplete returned HTTP {}",
                response.status()
            )));
        }

        let body: AutocompleteResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        first_match(raw_input, body)
    }
}

#[async_trait]
impl ForecastFetcher for WundergroundClient {
    async fn fetch(&self, query_path: &str, api_key: &str) -> Vec<ForecastPoint> {
        match self.fetch_hourly(query_path, api_key).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("Forecast fetch for {} failed: {}", query_path, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paris_json() -> serde_json::Value {
        serde_json::json!({"RESULTS": [
            {
                "name": "Paris, France",
                "type": "city",
                "c": "FR",
                "zmw": "00000.45.07156",
                "tz": "Europe/Paris",
                "l": "/q/zmw:00000.45.07156",
                "lat": "48.860001",
                "lon": "2.350000"
            }
        ]})
    }

    fn hourly_json() -> serde_json::Value {
        serde_json::json!({"hourly_forecast": [
            {
                "FCTTIME": {"epoch": "1461434400"},
                "temp": {"english": "66", "metric": "19"},
                "feelslike": {"english": "65", "metric": "18"},
                "icon_url": "http://icons.wxug.com/i/c/k/partlycloudy.gif",
                "pop": "15"
            },
            {
                "FCTTIME": {"epoch": "1461438000"},
                "temp": {"english": "67", "metric": "19"},
                "icon_url": "",
                "pop": "0"
            },
            {
                "FCTTIME": {"epoch": "1461441600"},
                "temp": {"english": "", "metric": ""}
            }
        ]})
    }

    async fn client_for(server: &MockServer) -> WundergroundClient {
        WundergroundClient::new(&server.uri(), &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_geocode_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/aq"))
            .and(query_param("query", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_json()))
            .mount(&server)
            .await;

        let found = client_for(&server).await.geocode(" Paris ").await.unwrap();
        assert_eq!(found.name, "Paris, France");
        assert_eq!(found.zmw, "00000.45.07156");
        assert_eq!(found.url, "/q/zmw:00000.45.07156");
    }

    #[tokio::test]
    async fn test_geocode_no_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/aq"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"RESULTS": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.geocode("Boston").await.unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_geocode_blank_input_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_json()))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).await.geocode("   ").await.unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_geocode_garbage_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/aq"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.geocode("x").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_geocode_result_without_zmw_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/aq"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"RESULTS": [{"name": "France", "type": "country"}]}),
            ))
            .mount(&server)
            .await;

        let err = client_for(&server).await.geocode("France").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_parses_hourly_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/KEY/hourly/q/zmw:10027.1.99999.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hourly_json()))
            .mount(&server)
            .await;

        let points = client_for(&server)
            .await
            .fetch("/q/zmw:10027.1.99999", "KEY")
            .await;

        // The third hour has no usable temperature and is dropped.
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, 1_461_434_400_000);
        assert_eq!(points[0].temp, 66);
        assert_eq!(points[0].temp_c, 19);
        assert_eq!(points[0].feel, 65);
        assert_eq!(points[0].pop, 15);
        assert_eq!(
            points[0].icon.as_deref(),
            Some("http://icons.wxug.com/i/c/k/partlycloudy.gif")
        );
        assert_eq!(points[1].icon, None);
        assert_eq!(points[1].feel, 67);
    }

    #[tokio::test]
    async fn test_fetch_error_response_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"response": {"error": {"type": "keynotfound"}}}),
            ))
            .mount(&server)
            .await;

        let points = client_for(&server).await.fetch("/q/zmw:1", "bad").await;
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_http_failure_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let points = client_for(&server).await.fetch("/q/zmw:1", "KEY").await;
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_hourly_reports_external_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .fetch_hourly("/q/zmw:1", "KEY")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(msg) if msg.contains("503")));
    }

    #[test]
    fn test_scalar_accepts_numbers_and_strings() {
        assert_eq!(Scalar::Num(18.6).as_i32(), Some(19));
        assert_eq!(Scalar::Str(" 66 ".to_string()).as_i32(), Some(66));
        assert_eq!(Scalar::Str("".to_string()).as_i32(), None);
    }
}

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A geocoded place, keyed by the provider-issued `zmw` identifier.
///
/// `cache` holds the serialized forecast payload (a JSON array of forecast
/// points) and is empty until the first fetch. `last_updated` only moves when
/// a fetch returned data.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Location {
    pub zmw: String,
    pub name: String,
    /// Provider query path used to fetch forecasts (e.g. `/q/zmw:10027.1.99999`).
    pub url: String,
    pub cache: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Location {
    /// A location that has never been fetched.
    pub fn new(zmw: impl Into<String>, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zmw: zmw.into(),
            name: name.into(),
            url: url.into(),
            cache: String::new(),
            last_updated: None,
        }
    }
}

/// The most recent lookup for some raw input, joined with its location.
#[derive(Debug, Clone, FromRow)]
pub struct LookupEntry {
    pub user_input: String,
    pub looked_up_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub location: Location,
}

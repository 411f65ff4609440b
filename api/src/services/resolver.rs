//! Resolve free-form user input to a location.
//!
//! Fallback chain:
//!   1. the most recent lookup for the exact input, if younger than a week
//!   2. the upstream geocoder
//!   3. the most recent lookup for [`DEFAULT_USER_INPUT`]
//!   4. the hard-coded default location
//!
//! Steps 3 and 4 pair the location with [`DEFAULT_USER_INPUT`] rather than
//! the original input, so unresolvable input never lands in lookup history.

use chrono::{DateTime, Utc};

use crate::db::models::Location;
use crate::db::store::RecordStore;
use crate::errors::{AppError, CycleWarning};
use crate::helpers::younger_than;
use crate::services::upstream::Geocoder;

/// Input used whenever the user's own input cannot be resolved.
pub const DEFAULT_USER_INPUT: &str = "10027";

/// Identity, query path and name of the built-in fallback location.
pub const DEFAULT_ZMW: &str = "10027.1.99999";
pub const DEFAULT_URL: &str = "/q/zmw:10027.1.99999";
pub const DEFAULT_LOCATION_NAME: &str = "10027 - New York, NY";

/// How long a previous lookup is trusted before geocoding again (7 days).
pub const LOOKUP_TTL_SECS: i64 = 604_800;

/// Outcome of resolving one raw input.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub location: Location,
    /// The input to record and carry forward: the raw input on success,
    /// [`DEFAULT_USER_INPUT`] after a fallback.
    pub normalized_input: String,
    pub warning: Option<CycleWarning>,
}

pub fn default_location() -> Location {
    Location::new(DEFAULT_ZMW, DEFAULT_URL, DEFAULT_LOCATION_NAME)
}

/// Resolve `raw_input` to a location. Only record store failures are errors.
pub async fn resolve(
    store: &dyn RecordStore,
    geocoder: &dyn Geocoder,
    raw_input: &str,
    now: DateTime<Utc>,
) -> Result<Resolution, AppError> {
    let last_lookup = store.find_latest_lookup(raw_input).await?;
    tracing::info!(
        "DB result for location {:?}: {:?}",
        raw_input,
        last_lookup.as_ref().map(|l| &l.location.zmw)
    );

    if let Some(entry) = last_lookup {
        if younger_than(entry.looked_up_at, now, LOOKUP_TTL_SECS) {
            tracing::info!("Got location info for {:?} from the cache", entry.user_input);
            return Ok(Resolution {
                location: entry.location,
                normalized_input: raw_input.to_string(),
                warning: None,
            });
        }
    }

    match geocoder.geocode(raw_input).await {
        Ok(found) => {
            tracing::info!(
                "Got location info from autocomplete API: {:?} -> {}, {}, {}",
                raw_input,
                found.url,
                found.name,
                found.zmw
            );
            // Keep the stored payload and refresh time of a known location.
            let location = match store.find_location(&found.zmw).await? {
                Some(mut stored) => {
                    stored.url = found.url;
                    stored.name = found.name;
                    stored
                }
                None => Location::new(found.zmw, found.url, found.name),
            };
            Ok(Resolution {
                location,
                normalized_input: raw_input.to_string(),
                warning: None,
            })
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse {:?} ({}). Using {}",
                raw_input,
                e,
                DEFAULT_USER_INPUT
            );
            let location = match store.find_latest_lookup(DEFAULT_USER_INPUT).await? {
                Some(entry) => entry.location,
                None => default_location(),
            };
            Ok(Resolution {
                location,
                normalized_input: DEFAULT_USER_INPUT.to_string(),
                warning: Some(CycleWarning::ResolutionFailure {
                    input: raw_input.to_string(),
                }),
            })
        }
    }
}

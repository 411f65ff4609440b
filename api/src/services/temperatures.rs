//! Temperature summary over the first hours of a forecast.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::services::upstream::ForecastPoint;

/// Number of forecast hours shown when nothing else is known.
pub const DEFAULT_NUM_HOURS: i64 = 12;

/// Temperature unit selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Units {
    #[default]
    F,
    C,
}

impl FromStr for Units {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F" => Ok(Units::F),
            "C" => Ok(Units::C),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::F => f.write_str("F"),
            Units::C => f.write_str("C"),
        }
    }
}

impl ForecastPoint {
    /// Temperature in the requested unit.
    pub fn temperature(&self, units: Units) -> i32 {
        match units {
            Units::F => self.temp,
            Units::C => self.temp_c,
        }
    }
}

/// Current, max and min temperature plus the leading icon of a window.
///
/// Every field is `None` when the window is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemperatureSummary {
    pub current: Option<i32>,
    pub max: Option<i32>,
    pub min: Option<i32>,
    pub icon: Option<String>,
}

/// The first `hours` points of a forecast. Non-positive `hours` is empty.
pub fn window(forecast: &[ForecastPoint], hours: i64) -> &[ForecastPoint] {
    let take = usize::try_from(hours).unwrap_or(0).min(forecast.len());
    &forecast[..take]
}

/// Summarize the first `hours` points of `forecast` in `units`.
pub fn summarize(forecast: &[ForecastPoint], hours: i64, units: Units) -> TemperatureSummary {
    let points = window(forecast, hours);
    let Some(first) = points.first() else {
        return TemperatureSummary::default();
    };

    let temps = points.iter().map(|p| p.temperature(units));
    TemperatureSummary {
        current: Some(first.temperature(units)),
        max: temps.clone().max(),
        min: temps.min(),
        icon: first.icon.clone(),
    }
}

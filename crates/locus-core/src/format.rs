//! Distance presentation policy.

use crate::locale::Locale;
use std::fmt;

/// A distance ready for display: numeric text and unit label kept apart so
/// widgets can style them separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceDisplay {
    pub value: String,
    pub unit: &'static str,
}

impl DistanceDisplay {
    /// Under one kilometer: whole meters. Otherwise kilometers, two decimals.
    pub fn new(km: f64, locale: Locale) -> Self {
        if km < 1.0 {
            Self {
                value: format!("{:.0}", (km * 1000.0).round()),
                unit: locale.meters_label(),
            }
        } else {
            Self {
                value: format!("{:.2}", km),
                unit: locale.kilometers_label(),
            }
        }
    }
}

impl fmt::Display for DistanceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

pub fn format_distance(km: f64, locale: Locale) -> String {
    DistanceDisplay::new(km, locale).to_string()
}

/// English phrasing used inside the voice guidance prompt.
pub fn spoken_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} meters", (km * 1000.0).round())
    } else {
        format!("{:.2} kilometers", km)
    }
}

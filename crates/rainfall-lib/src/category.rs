//! Rainfall severity categories
//!
//! Maps a predicted RR value onto three ordered buckets:
//! `(-inf, 0.2]`, `(0.2, 0.5]` and `(0.5, inf)`.

use serde::{Serialize, Serializer};
use std::fmt;

/// Upper bound (inclusive) of the Clear/Light bucket
pub const CLEAR_LIGHT_MAX: f64 = 0.2;

/// Upper bound (inclusive) of the Moderate bucket
pub const MODERATE_MAX: f64 = 0.5;

/// Severity label derived from a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    ClearLight,
    Moderate,
    Extreme,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::ClearLight, Category::Moderate, Category::Extreme];

    /// Total over every f64. Negative values are Clear/Light; NaN fails both
    /// comparisons and lands in Extreme.
    pub fn from_prediction(prediction: f64) -> Self {
        if prediction <= CLEAR_LIGHT_MAX {
            Category::ClearLight
        } else if prediction <= MODERATE_MAX {
            Category::Moderate
        } else {
            Category::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::ClearLight => "Clear/Light",
            Category::Moderate => "Moderate",
            Category::Extreme => "Extreme",
        }
    }

    /// Severity marker used as the badge prefix
    pub fn marker(&self) -> &'static str {
        match self {
            Category::ClearLight => "🟢",
            Category::Moderate => "🟡",
            Category::Extreme => "🔴",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::ClearLight => "☀️",
            Category::Moderate => "🌤️",
            Category::Extreme => "🌧️",
        }
    }

    pub fn badge(&self) -> String {
        format!("{} {}", self.marker(), self.label())
    }

    /// Metric label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ClearLight => "clear_light",
            Category::Moderate => "moderate",
            Category::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Categorize a predicted RR value
pub fn categorize(prediction: f64) -> Category {
    Category::from_prediction(prediction)
}

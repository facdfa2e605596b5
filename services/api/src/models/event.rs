//! Fields shared by pending requests and publications

use chrono::{DateTime, Utc};
use media::MediaBundle;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApiError;

/// Fixed set of event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Musical,
    Charity,
    Cultural,
    Social,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Musical,
        Category::Charity,
        Category::Cultural,
        Category::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Musical => "musical",
            Category::Charity => "charity",
            Category::Cultural => "cultural",
            Category::Social => "social",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ApiError::Validation(format!("Unrecognized category: {}", s.trim())))
    }
}

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(deserialize_with = "coordinate")]
    pub lat: f64,
    #[serde(deserialize_with = "coordinate")]
    pub long: f64,
}

impl GeoPoint {
    /// Reject coordinates outside the WGS84 ranges
    pub fn check(&self) -> Result<(), ApiError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ApiError::Validation(format!(
                "Latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.long) {
            return Err(ApiError::Validation(format!(
                "Longitude {} is outside [-180, 180]",
                self.long
            )));
        }
        Ok(())
    }
}

/// Form inputs send coordinates as numbers or numeric strings
fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a coordinate: {:?}", s)))?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("coordinate must be finite"))
    }
}

/// Everything a request carries into its publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: GeoPoint,
    pub category: Category,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub medias: MediaBundle,
}

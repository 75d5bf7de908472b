//! Obstacle records and their persistence.
//!
//! An [`Obstacle`] is one hazard reported along the convoy route. Records are
//! created through [`ObstacleStore::add`] from a [`NewObstacle`], usually
//! produced by validating an [`ObstacleForm`].

mod form;
mod store;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub use form::{parse_coordinate, validate_latitude, validate_longitude, ObstacleForm};
pub use store::ObstacleStore;

/// Title given to obstacles whose title is blank.
pub const DEFAULT_TITLE: &str = "Obstacle";

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A reported roadway hazard.
///
/// Serialized with camelCase field names; absent coordinates and photo are
/// omitted from the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obstacle {
    /// Unique id, `<created millis>-<random suffix>`.
    pub id: String,

    /// Short label, never empty.
    pub title: String,

    /// Free-form details, possibly empty.
    #[serde(default)]
    pub description: String,

    /// Latitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Reference to a locally captured photo. Opaque to this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,

    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Obstacle {
    /// Both coordinates, when the obstacle has them.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// Creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

/// Fields supplied when adding an obstacle.
///
/// `id` and `created_at` are normally left unset and generated by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewObstacle {
    /// Caller-chosen id.
    pub id: Option<String>,
    /// Caller-chosen creation time in epoch milliseconds.
    pub created_at: Option<i64>,
    /// Title; blank titles become [`DEFAULT_TITLE`].
    pub title: String,
    /// Description.
    pub description: String,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Photo reference.
    pub photo_uri: Option<String>,
}

impl NewObstacle {
    /// Start a new obstacle with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set both coordinates.
    #[must_use]
    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the photo reference.
    #[must_use]
    pub fn photo_uri(mut self, uri: impl Into<String>) -> Self {
        self.photo_uri = Some(uri.into());
        self
    }

    /// Use a fixed id instead of generating one.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Use a fixed creation time instead of now.
    #[must_use]
    pub fn created_at(mut self, millis: i64) -> Self {
        self.created_at = Some(millis);
        self
    }

    /// Build the stored record.
    ///
    /// Trims text, replaces a blank title with `default_title`, and drops any
    /// coordinate that is not finite or lies outside its geographic range.
    pub(crate) fn into_obstacle(self, now_millis: i64, default_title: &str) -> Obstacle {
        let created_at = self.created_at.unwrap_or(now_millis);
        let id = self.id.unwrap_or_else(|| generate_id(created_at));

        let title = match self.title.trim() {
            "" => default_title.to_string(),
            trimmed => trimmed.to_string(),
        };

        Obstacle {
            id,
            title,
            description: self.description.trim().to_string(),
            latitude: self.latitude.filter(|v| v.is_finite() && LATITUDE_RANGE.contains(v)),
            longitude: self
                .longitude
                .filter(|v| v.is_finite() && LONGITUDE_RANGE.contains(v)),
            photo_uri: self.photo_uri,
            created_at,
        }
    }
}

/// Generate an obstacle id: the timestamp plus a six-character random suffix.
#[must_use]
pub fn generate_id(millis: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}", &suffix[..6])
}

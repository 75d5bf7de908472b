//! Validation of user-entered obstacle fields.
//!
//! Coordinates arrive as free text. A comma is accepted as the decimal
//! separator, blank input means "no coordinate", and anything outside the
//! geographic range is rejected before the obstacle reaches the store.

use tracing::debug;

use super::{NewObstacle, LATITUDE_RANGE, LONGITUDE_RANGE};
use crate::error::{Error, Result};

/// Raw contents of the add-obstacle form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObstacleForm {
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Latitude text, may be blank.
    pub latitude: String,
    /// Longitude text, may be blank.
    pub longitude: String,
    /// Photo reference from the camera, if one was taken.
    pub photo_uri: Option<String>,
}

impl ObstacleForm {
    /// Check the form and turn it into fields for [`super::ObstacleStore::add`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNumber`], [`Error::InvalidLatitude`] or
    /// [`Error::InvalidLongitude`] when a coordinate is unusable.
    pub fn validate(&self) -> Result<NewObstacle> {
        let latitude = parse_coordinate(&self.latitude)?
            .map(validate_latitude)
            .transpose()?;
        let longitude = parse_coordinate(&self.longitude)?
            .map(validate_longitude)
            .transpose()?;

        debug!(
            "Form accepted: lat={:?} lon={:?} photo={}",
            latitude,
            longitude,
            self.photo_uri.is_some()
        );

        Ok(NewObstacle {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            latitude,
            longitude,
            photo_uri: self.photo_uri.clone(),
            ..NewObstacle::default()
        })
    }
}

/// Parse a coordinate typed by the user.
///
/// Returns `Ok(None)` for blank input. `48,8566` and `48.8566` are equivalent.
///
/// # Errors
///
/// Returns [`Error::InvalidNumber`] if the text is not a finite number.
pub fn parse_coordinate(text: &str) -> Result<Option<f64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let normalized = trimmed.replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(Error::InvalidNumber {
            input: trimmed.to_string(),
        }),
    }
}

/// Accept a latitude within [-90, 90].
///
/// # Errors
///
/// Returns [`Error::InvalidLatitude`] otherwise.
pub fn validate_latitude(value: f64) -> Result<f64> {
    if LATITUDE_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidLatitude { value })
    }
}

/// Accept a longitude within [-180, 180].
///
/// # Errors
///
/// Returns [`Error::InvalidLongitude`] otherwise.
pub fn validate_longitude(value: f64) -> Result<f64> {
    if LONGITUDE_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidLongitude { value })
    }
}

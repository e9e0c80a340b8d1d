//! Geographic primitives: coordinates and great-circle distance.
//!
//! Distances use the Haversine formula on a sphere of radius 6371 km.
//! The distance computation is total over any pair of finite inputs;
//! range checking lives in [`Coordinate::new`] and is the caller's choice.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius used for all distance estimates.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid coordinates ({lat}, {lon}). Lat: -90..90, Lon: -180..180")]
    OutOfRange { lat: f64, lon: f64 },
    #[error("Cannot parse '{0}' as 'lat,lon'")]
    Unparsable(String),
}

impl Coordinate {
    /// Checked constructor: rejects latitude outside [-90, 90] and
    /// longitude outside [-180, 180] (NaN included).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::OutOfRange { lat: latitude, lon: longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Build a coordinate without range checks.
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(*self, *other)
    }

    /// Shift by the given degree offsets. No wrapping is applied.
    pub fn offset(&self, dlat: f64, dlon: f64) -> Self {
        Self::new_unchecked(self.latitude + dlat, self.longitude + dlon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_coords(self.latitude, self.longitude))
    }
}

/// Parses `"lat,lon"` (whitespace around either number is ignored) and
/// range-checks the result.
impl FromStr for Coordinate {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| GeoError::Unparsable(s.to_string()))?;
        let lat: f64 = lat.trim().parse().map_err(|_| GeoError::Unparsable(s.to_string()))?;
        let lon: f64 = lon.trim().parse().map_err(|_| GeoError::Unparsable(s.to_string()))?;
        Coordinate::new(lat, lon)
    }
}

/// Haversine great-circle distance between two points, in kilometres.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.latitude - from.latitude) * DEG;
    let d_lon = (to.longitude - from.longitude) * DEG;

    let a = (d_lat / 2.0).sin().powi(2)
        + (from.latitude * DEG).cos() * (to.latitude * DEG).cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Human-readable coordinate string, e.g. `17.8292°S, 31.0522°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

use std::fmt;

use serde::{Deserialize, Serialize};

use super::codec::format_sexagesimal;

/// Placeholder shown for an unknown coordinate field
pub const UNKNOWN_FIELD: &str = "--:--:--";

/// Layout of a sexagesimal field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleFormat {
    /// `±DD:MM:SS` - declination, latitude
    Signed,
    /// `DDD:MM:SS` - longitude
    Degrees,
    /// `HH:MM:SS` - right ascension
    Hours,
}

impl AngleFormat {
    /// Format used for latitude-like (`true`) or longitude-like (`false`) values
    pub fn for_latitude_like(latitude_like: bool) -> Self {
        if latitude_like {
            AngleFormat::Signed
        } else {
            AngleFormat::Degrees
        }
    }
}

/// Equatorial position as exchanged with the mount
///
/// Both fields are sexagesimal strings: `ra` as `HH:MM:SS`, `dec` as `±DD:MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub ra: String,
    pub dec: String,
}

impl Coordinate {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
        }
    }

    /// Build from decimal hours of right ascension and decimal degrees of declination
    pub fn from_decimal(ra_hours: f64, dec_degrees: f64) -> Self {
        Self {
            ra: format_sexagesimal(ra_hours, AngleFormat::Hours),
            dec: format_sexagesimal(dec_degrees, AngleFormat::Signed),
        }
    }

    /// Coordinate rendered when the position is unknown
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FIELD, UNKNOWN_FIELD)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA: {}, DEC: {}", self.ra, self.dec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal() {
        let coord = Coordinate::from_decimal(5.5, -5.25);
        assert_eq!(coord.ra, "05:30:00");
        assert_eq!(coord.dec, "-05:15:00");
    }

    #[test]
    fn test_unknown_display() {
        let coord = Coordinate::unknown();
        assert_eq!(coord.to_string(), "RA: --:--:--, DEC: --:--:--");
    }

    #[test]
    fn test_format_for_latitude_like() {
        assert_eq!(AngleFormat::for_latitude_like(true), AngleFormat::Signed);
        assert_eq!(AngleFormat::for_latitude_like(false), AngleFormat::Degrees);
    }

    #[test]
    fn test_deserialize_position_payload() {
        let coord: Coordinate =
            serde_json::from_str(r#"{"ra": "12:30:45", "dec": "+41:16:09"}"#).unwrap();
        assert_eq!(coord, Coordinate::new("12:30:45", "+41:16:09"));
    }
}

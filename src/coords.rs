use std::{fmt, str::FromStr};

use thiserror::Error;

/// Separators accepted between latitude and longitude.
const SEPARATORS: [char; 3] = [';', '$', '%'];

#[derive(Debug, Error, PartialEq)]
pub enum CoordParseError {
    #[error("expected 'latitude{{;|$|%}}longitude', got '{0}'")]
    BadShape(String),
    #[error("unsupported coordinate format: '{0}'")]
    BadCoordinate(String),
    #[error("latitude must be between -90 and 90 degrees")]
    LatitudeOutOfRange,
    #[error("longitude must be between -180 and 180 degrees")]
    LongitudeOutOfRange,
}

/// A WGS84 point entered by a user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordParseError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordParseError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordParseError::LongitudeOutOfRange);
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unified: String =
            s.trim().chars().map(|c| if SEPARATORS.contains(&c) { ';' } else { c }).collect();

        let parts: Vec<&str> = unified.split(';').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(CoordParseError::BadShape(s.trim().to_string()));
        }

        let latitude = parse_coordinate(parts[0])?;
        let longitude = parse_coordinate(parts[1])?;
        Self::new(latitude, longitude)
    }
}

/// Returns true when the text plausibly contains a coordinate pair rather
/// than a search query.
pub fn looks_like_coordinates(text: &str) -> bool {
    text.chars().any(|c| SEPARATORS.contains(&c))
}

/// Parses a single coordinate given as decimal degrees (`55.75`),
/// degrees and decimal minutes (`55 45.348`), or degrees, minutes and
/// seconds (`55 45 20.9`, `55°45'20.9"`).
fn parse_coordinate(raw: &str) -> Result<f64, CoordParseError> {
    // Degree/minute/second symbols act as plain separators.
    let cleaned: String =
        raw.chars().map(|c| if matches!(c, '°' | '\'' | '"') { ' ' } else { c }).collect();

    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    let numbers: Vec<f64> = parts
        .iter()
        .map(|p| p.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| CoordParseError::BadCoordinate(raw.trim().to_string()))?;

    match numbers.as_slice() {
        [degrees] => Ok(*degrees),
        [degrees, minutes] => Ok(degrees + minutes / 60.0),
        [degrees, minutes, seconds] => Ok(degrees + minutes / 60.0 + seconds / 3600.0),
        _ => Err(CoordParseError::BadCoordinate(raw.trim().to_string())),
    }
}

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// Authority name marking user-defined (regional) coordinate systems.
const CUSTOM_AUTHORITY: &str = "custom";

lazy_static! {
    static ref WKT_NAME_RE: Regex =
        Regex::new(r#"(?i)(PROJCS|GEOGCS)\["([^"]+)""#).expect("invalid WKT name regex");
}

/// A row of the `spatial_ref_sys` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CrsRecord {
    pub srid: i32,
    pub auth_name: Option<String>,
    pub auth_srid: Option<i32>,
    pub srtext: Option<String>,
    pub proj4text: Option<String>,
}

impl CrsRecord {
    /// Whether this is a user-defined coordinate system as opposed to a
    /// registry (EPSG) one.
    pub fn is_custom(&self) -> bool {
        self.auth_name.as_deref() == Some(CUSTOM_AUTHORITY)
    }

    /// Looks up a text field by its column name. Used by export validation,
    /// which is driven by per-format required-field lists.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        match name {
            "srtext" => self.srtext.as_deref(),
            "proj4text" => self.proj4text.as_deref(),
            "auth_name" => self.auth_name.as_deref(),
            _ => None,
        }
    }

    /// The coordinate system name embedded in the WKT definition
    /// (`PROJCS["..."]` or `GEOGCS["..."]`), when present.
    pub fn wkt_name(&self) -> Option<&str> {
        let srtext = self.srtext.as_deref()?;
        WKT_NAME_RE.captures(srtext).and_then(|c| c.get(2)).map(|m| m.as_str())
    }

    /// A short human-readable label for keyboards and inline results.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.wkt_name() {
            return name.to_string();
        }
        match (&self.auth_name, self.auth_srid) {
            (Some(auth), Some(auth_srid)) => format!("{auth}:{auth_srid}"),
            _ => format!("SRID {}", self.srid),
        }
    }
}

impl fmt::Display for CrsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.srid, self.display_name())
    }
}

/// A regional zone from the `custom_geom` table that contains a queried
/// point.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ZoneInfo {
    pub srid: i32,
    pub name: Option<String>,
    pub info: Option<String>,
}

/// Reference ellipsoid parameters from the `ellps_all` table, keyed by the
/// proj4 `+ellps` name.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Ellipsoid {
    /// The ellipsoid identifier as Global Mapper spells it in WKT.
    pub gm_id: String,
    pub semi_major: f64,
    pub inverse_flattening: f64,
}

//! Shared machinery for the Global Mapper PRJ exporters: WKT cleanup, output
//! file naming and detailed WKT generation for user-defined coordinate
//! systems.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    export::ExportError,
    storage::{CrsRecord, CrsStorage},
};

const MAX_FILE_STEM_LEN: usize = 100;

lazy_static! {
    static ref PROJ4_PARAM_RE: Regex =
        Regex::new(r"\+([A-Za-z0-9_]+)=(\S+)").expect("invalid proj4 parameter regex");
    static ref FILENAME_UNSAFE_RE: Regex =
        Regex::new(r#"[\\/:"*?<>|\s]+"#).expect("invalid filename regex");
    static ref UNDERSCORE_RUN_RE: Regex = Regex::new(r"_+").expect("invalid underscore regex");
}

/// The Global Mapper release a PRJ file targets. The two releases disagree on
/// the sign convention of the `TOWGS84` rotation terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GmVersion {
    V20,
    V25,
}

impl GmVersion {
    /// v20 expects the rotation terms negated relative to the proj4
    /// `+towgs84` values; v25 takes them as-is.
    fn flips_rotations(self) -> bool {
        matches!(self, GmVersion::V20)
    }

    fn file_suffix(self) -> &'static str {
        match self {
            GmVersion::V20 => "_v20",
            GmVersion::V25 => "_v25",
        }
    }
}

/// Collapses the WKT definition onto a single normalized line.
pub(crate) fn clean_wkt(wkt: &str) -> String {
    let mut out = String::with_capacity(wkt.len());
    let mut last_space = false;
    for c in wkt.trim().chars() {
        if c.is_whitespace() {
            last_space = true;
            continue;
        }
        // No space after separators and opening brackets.
        if last_space && !out.is_empty() && !out.ends_with([',', '(', '[']) {
            out.push(' ');
        }
        last_space = false;
        out.push(c);
    }
    out
}

/// Strips characters that are hostile to filesystems, collapsing whitespace
/// and separator runs into single underscores.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let replaced = FILENAME_UNSAFE_RE.replace_all(name, "_");
    let collapsed = UNDERSCORE_RUN_RE.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');
    trimmed.chars().take(MAX_FILE_STEM_LEN).collect()
}

/// Derives the output file stem (without extension) for a record.
///
/// UTM zones get their canonical name, custom systems are named after their
/// WKT text plus a Global Mapper version suffix, and registry systems prefer
/// the name embedded in the WKT definition.
pub(crate) fn file_stem(record: &CrsRecord, version: Option<GmVersion>) -> String {
    match record.srid {
        32601..=32660 => return format!("UTM_zone_{:02}N", record.srid - 32600),
        32701..=32760 => return format!("UTM_zone_{:02}S", record.srid - 32700),
        _ => {}
    }

    if record.is_custom() {
        let base = match record.srtext.as_deref().filter(|s| !s.is_empty()) {
            Some(srtext) => sanitize_file_name(srtext),
            None => format!("custom_srid_{}", record.srid),
        };
        let suffix = version.map(GmVersion::file_suffix).unwrap_or("");
        return format!("{base}{suffix}");
    }

    let identifier = record.auth_srid.unwrap_or(record.srid);
    if let Some(name) = record.wkt_name() {
        return format!("{}_{identifier}", sanitize_file_name(name));
    }

    let prefix = record.auth_name.as_deref().filter(|a| !a.is_empty()).unwrap_or("EPSG");
    format!("{}_{identifier}", sanitize_file_name(prefix))
}

/// Parses `+key=value` pairs out of a proj4 definition.
pub(crate) fn parse_proj4(proj4: &str) -> HashMap<&str, &str> {
    PROJ4_PARAM_RE
        .captures_iter(proj4)
        .map(|c| {
            let key = c.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = c.get(2).map(|m| m.as_str()).unwrap_or_default();
            (key, value)
        })
        .collect()
}

fn wkt_error(srid: i32, reason: impl Into<String>) -> ExportError {
    ExportError::WktGeneration { srid, reason: reason.into() }
}

fn param_f64(params: &HashMap<&str, &str>, key: &str, default: f64) -> Result<f64, String> {
    match params.get(key) {
        Some(raw) => raw.parse().map_err(|_| format!("malformed '{key}' parameter: '{raw}'")),
        None => Ok(default),
    }
}

/// Generates a detailed Transverse Mercator WKT for a user-defined
/// coordinate system from its proj4 definition. The ellipsoid axes and datum
/// name are resolved through storage lookup tables.
pub(crate) async fn custom_wkt(
    storage: &dyn CrsStorage,
    record: &CrsRecord,
    version: GmVersion,
) -> Result<String, ExportError> {
    let srid = record.srid;
    let proj4 = record
        .proj4text
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| wkt_error(srid, "missing proj4 definition"))?;

    let params = parse_proj4(proj4);

    let ellps_name =
        *params.get("ellps").ok_or_else(|| wkt_error(srid, "missing 'ellps' parameter"))?;
    let towgs84 =
        *params.get("towgs84").ok_or_else(|| wkt_error(srid, "missing 'towgs84' parameter"))?;

    let shifts: Vec<f64> = towgs84
        .split(',')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| wkt_error(srid, format!("malformed 'towgs84' parameter: '{towgs84}'")))?;
    let &[dx, dy, dz, mut rx, mut ry, mut rz, scale] = shifts.as_slice() else {
        return Err(wkt_error(srid, format!("'towgs84' must have 7 terms, got {}", shifts.len())));
    };

    if version.flips_rotations() {
        rx = -rx;
        ry = -ry;
        rz = -rz;
    }

    let ellipsoid = storage
        .find_ellipsoid(ellps_name)
        .await?
        .ok_or_else(|| wkt_error(srid, format!("ellipsoid '{ellps_name}' not found")))?;

    let datum_name = storage
        .find_datum_name(&format!("+towgs84={towgs84}"))
        .await?
        .unwrap_or_else(|| format!("Custom_Datum_{srid}"));

    let scale_factor = match params.get("k_0") {
        Some(_) => param_f64(&params, "k_0", 1.0),
        None => param_f64(&params, "k", 1.0),
    }
    .map_err(|reason| wkt_error(srid, reason))?;
    let lat_0 = param_f64(&params, "lat_0", 0.0).map_err(|reason| wkt_error(srid, reason))?;
    let lon_0 = param_f64(&params, "lon_0", 0.0).map_err(|reason| wkt_error(srid, reason))?;
    let x_0 = param_f64(&params, "x_0", 0.0).map_err(|reason| wkt_error(srid, reason))?;
    let y_0 = param_f64(&params, "y_0", 0.0).map_err(|reason| wkt_error(srid, reason))?;

    Ok(format!(
        "PROJCS[\"Transverse_Mercator\",\
         GEOGCS[\"{datum_name}\",\
         DATUM[\"{datum_name}\",\
         SPHEROID[\"{spheroid}\",{a},{c}],\
         TOWGS84[{dx:.9},{dy:.9},{dz:.9},{rx:.12},{ry:.12},{rz:.12},{scale:.15}]],\
         PRIMEM[\"Greenwich\",0.0],\
         UNIT[\"Degree\",0.017453292519943295]],\
         PROJECTION[\"Transverse_Mercator\"],\
         PARAMETER[\"latitude_of_origin\",{lat_0}],\
         PARAMETER[\"central_meridian\",{lon_0}],\
         PARAMETER[\"scale_factor\",{scale_factor}],\
         PARAMETER[\"false_easting\",{x_0}],\
         PARAMETER[\"false_northing\",{y_0}],\
         UNIT[\"Meter\",1.0]]",
        spheroid = ellipsoid.gm_id,
        a = ellipsoid.semi_major,
        c = ellipsoid.inverse_flattening,
    ))
}

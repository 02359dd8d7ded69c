mod crs_record;
pub mod postgres;

use async_trait::async_trait;
pub use crs_record::{CrsRecord, Ellipsoid, ZoneInfo};
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Db(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Read access to the coordinate-system database.
#[automock]
#[async_trait]
pub trait CrsStorage: Send + Sync {
    /// Fetch a single coordinate system by SRID.
    async fn find_by_srid(&self, srid: i32) -> StorageResult<Option<CrsRecord>>;

    /// Plain containment search over the WKT definition, authority name and
    /// textual SRID.
    async fn search_text(&self, query: &str, limit: usize) -> StorageResult<Vec<CrsRecord>>;

    /// Regional zones whose geometry contains the given WGS84 point.
    async fn zones_containing(&self, lat: f64, lon: f64) -> StorageResult<Vec<ZoneInfo>>;

    /// Transform a WGS84 point into the target system. Returns `None` when
    /// the database cannot produce finite coordinates.
    async fn transform_point(
        &self,
        lat: f64,
        lon: f64,
        srid: i32,
    ) -> StorageResult<Option<(f64, f64)>>;

    /// Look up ellipsoid parameters by the proj4 `+ellps` name.
    async fn find_ellipsoid(&self, name: &str) -> StorageResult<Option<Ellipsoid>>;

    /// Look up a datum display name by its full `+towgs84=...` parameter
    /// string.
    async fn find_datum_name(&self, towgs84: &str) -> StorageResult<Option<String>>;
}

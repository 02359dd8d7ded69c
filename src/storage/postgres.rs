use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::storage::{CrsRecord, CrsStorage, Ellipsoid, StorageError, StorageResult, ZoneInfo};

const MAX_CONNECTIONS: u32 = 5;

/// `CrsStorage` backed by the PostGIS database.
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> StorageResult<Self> {
        debug!("Connecting to PostgreSQL database");
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Db(e.to_string()))?;

        Ok(Self { pool })
    }
}

/// Escapes `LIKE` wildcards so user input is matched literally.
fn escape_like(query: &str) -> String {
    query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl CrsStorage for PgStorage {
    async fn find_by_srid(&self, srid: i32) -> StorageResult<Option<CrsRecord>> {
        debug!("Fetching coordinate system with SRID {srid}");

        sqlx::query_as::<_, CrsRecord>(
            "SELECT srid, auth_name, auth_srid, srtext, proj4text
             FROM spatial_ref_sys
             WHERE srid = $1",
        )
        .bind(srid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Db(e.to_string()))
    }

    async fn search_text(&self, query: &str, limit: usize) -> StorageResult<Vec<CrsRecord>> {
        debug!("Searching coordinate systems matching '{query}'");

        let pattern = format!("%{}%", escape_like(query));

        sqlx::query_as::<_, CrsRecord>(
            "SELECT srid, auth_name, auth_srid, srtext, proj4text
             FROM spatial_ref_sys
             WHERE srtext ILIKE $1 OR auth_name ILIKE $1 OR CAST(srid AS TEXT) = $2
             ORDER BY srid
             LIMIT $3",
        )
        .bind(&pattern)
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Db(e.to_string()))
    }

    async fn zones_containing(&self, lat: f64, lon: f64) -> StorageResult<Vec<ZoneInfo>> {
        debug!("Looking up zones containing point ({lat}; {lon})");

        sqlx::query_as::<_, ZoneInfo>(
            "SELECT cg.srid, cg.name, cg.info
             FROM custom_geom cg
             WHERE ST_Contains(cg.geom, ST_SetSRID(ST_MakePoint($1, $2), 4326))",
        )
        .bind(lon)
        .bind(lat)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Db(e.to_string()))
    }

    async fn transform_point(
        &self,
        lat: f64,
        lon: f64,
        srid: i32,
    ) -> StorageResult<Option<(f64, f64)>> {
        debug!("Transforming point ({lat}; {lon}) into SRID {srid}");

        let row = sqlx::query_as::<_, (Option<f64>, Option<f64>)>(
            "SELECT ST_X(p), ST_Y(p)
             FROM (SELECT ST_Transform(ST_SetSRID(ST_MakePoint($1, $2), 4326), $3) AS p) AS q",
        )
        .bind(lon)
        .bind(lat)
        .bind(srid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Db(e.to_string()))?;

        Ok(match row {
            Some((Some(x), Some(y))) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        })
    }

    async fn find_ellipsoid(&self, name: &str) -> StorageResult<Option<Ellipsoid>> {
        sqlx::query_as::<_, Ellipsoid>(
            "SELECT gm_ellipsoid_id AS gm_id, a AS semi_major, c AS inverse_flattening
             FROM ellps_all
             WHERE name_el = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Db(e.to_string()))
    }

    async fn find_datum_name(&self, towgs84: &str) -> StorageResult<Option<String>> {
        let row = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT name_d FROM datum_all WHERE datum = $1",
        )
        .bind(towgs84)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Db(e.to_string()))?;

        Ok(row.and_then(|(name,)| name))
    }
}

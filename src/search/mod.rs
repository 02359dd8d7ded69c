
use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use mockall::automock;
use thiserror::Error;
use tracing::warn;

use crate::{
    coords::Coordinates,
    storage::{CrsRecord, CrsStorage, StorageError},
};

/// Shortest accepted non-numeric search query.
const MIN_QUERY_LEN: usize = 3;
/// How many point transforms run against the database at once.
const TRANSFORM_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must be at least {0} characters long")]
    QueryTooShort(usize),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

type Result<T> = std::result::Result<T, SearchError>;

/// A coordinate system that covers a queried point, with the point projected
/// into that system when the database could transform it.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMatch {
    pub srid: i32,
    pub name: String,
    pub info: Option<String>,
    pub projected: Option<(f64, f64)>,
}

#[automock]
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Find coordinate systems by SRID or free text.
    async fn search(&self, query: &str) -> Result<Vec<CrsRecord>>;

    /// Find coordinate systems applicable at a WGS84 point.
    async fn locate(&self, coords: Coordinates) -> Result<Vec<PointMatch>>;
}

pub struct DbSearchService {
    storage: Arc<dyn CrsStorage>,
    max_results: usize,
}

impl DbSearchService {
    pub fn new(storage: Arc<dyn CrsStorage>, max_results: usize) -> Self {
        Self { storage, max_results }
    }

    async fn project(&self, coords: Coordinates, srid: i32) -> Option<(f64, f64)> {
        match self.storage.transform_point(coords.latitude, coords.longitude, srid).await {
            Ok(point) => point,
            Err(e) => {
                warn!("Failed to transform point into SRID {srid}: {e}");
                None
            }
        }
    }
}

/// The northern-hemisphere UTM zone covering a point, as (srid, zone number).
fn utm_zone(coords: Coordinates) -> Option<(i32, i32)> {
    if coords.latitude < 0.0 {
        return None;
    }
    let zone = (((coords.longitude + 180.0) / 6.0) as i32 + 1).clamp(1, 60);
    Some((32600 + zone, zone))
}

#[async_trait]
impl SearchService for DbSearchService {
    async fn search(&self, query: &str) -> Result<Vec<CrsRecord>> {
        let query = query.trim();

        if let Ok(srid) = query.parse::<i32>() {
            return Ok(self.storage.find_by_srid(srid).await?.into_iter().collect());
        }

        if query.chars().count() < MIN_QUERY_LEN {
            return Err(SearchError::QueryTooShort(MIN_QUERY_LEN));
        }

        let mut seen = HashSet::new();
        let results = self
            .storage
            .search_text(query, self.max_results)
            .await?
            .into_iter()
            .filter(|record| seen.insert(record.srid))
            .take(self.max_results)
            .collect();
        Ok(results)
    }

    async fn locate(&self, coords: Coordinates) -> Result<Vec<PointMatch>> {
        let zones = self.storage.zones_containing(coords.latitude, coords.longitude).await?;

        let mut candidates: Vec<(i32, String, Option<String>)> = zones
            .into_iter()
            .map(|zone| {
                let name = zone.name.unwrap_or_else(|| format!("SRID {}", zone.srid));
                (zone.srid, name, zone.info)
            })
            .collect();

        if let Some((srid, zone)) = utm_zone(coords) {
            candidates.push((srid, format!("UTM zone {zone}N"), None));
        }

        let matches = stream::iter(candidates)
            .map(|(srid, name, info)| async move {
                let projected = self.project(coords, srid).await;
                PointMatch { srid, name, info, projected }
            })
            .buffered(TRANSFORM_CONCURRENCY)
            .collect()
            .await;

        Ok(matches)
    }
}

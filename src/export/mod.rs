pub mod civil3d;
pub mod format;
pub mod gmv20;
pub mod gmv25;
mod prj;
#[cfg(test)]
mod tests;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
pub use format::ExportFormat;
use mockall::automock;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    export::{civil3d::Civil3dExporter, gmv20::Gmv20Exporter, gmv25::Gmv25Exporter},
    storage::{CrsRecord, CrsStorage, StorageError},
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("coordinate system with SRID {0} not found")]
    SridNotFound(i32),
    #[error("missing required fields for {format}: {fields}")]
    MissingFields { format: ExportFormat, fields: String },
    #[error("field '{field}' exceeds the maximum length: {len} > {max}")]
    FieldTooLong { field: &'static str, len: usize, max: usize },
    #[error("cannot generate WKT for SRID {srid}: {reason}")]
    WktGeneration { srid: i32, reason: String },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Whether the error should be shown to the user as-is rather than
    /// reported as an internal failure.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ExportError::Storage(_) | ExportError::Io(_))
    }
}

/// A file produced by the export pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub format: ExportFormat,
    pub srid: i32,
}

/// A format-specific renderer: required-field schema, content, file name.
#[async_trait]
pub trait Exporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    /// Text fields that must be present and non-empty for this format.
    fn required_fields(&self) -> &'static [&'static str];

    async fn render(&self, record: &CrsRecord) -> Result<String, ExportError>;

    fn file_name(&self, record: &CrsRecord) -> String;
}

/// Runs the export pipeline for a format/SRID pair.
#[automock]
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export(&self, format: ExportFormat, srid: i32) -> Result<ExportedFile, ExportError>;
}

/// `ExportService` that renders into files under a configured output
/// directory.
pub struct FileExportService {
    storage: Arc<dyn CrsStorage>,
    exporters: HashMap<ExportFormat, Box<dyn Exporter>>,
    output_dir: PathBuf,
    max_field_length: usize,
}

impl FileExportService {
    pub fn new(
        storage: Arc<dyn CrsStorage>,
        output_dir: impl Into<PathBuf>,
        max_field_length: usize,
    ) -> Self {
        let mut exporters: HashMap<ExportFormat, Box<dyn Exporter>> = HashMap::new();
        exporters.insert(ExportFormat::Civil3dXml, Box::new(Civil3dExporter));
        exporters.insert(ExportFormat::Gmv20Prj, Box::new(Gmv20Exporter::new(storage.clone())));
        exporters.insert(ExportFormat::Gmv25Prj, Box::new(Gmv25Exporter::new(storage.clone())));

        Self { storage, exporters, output_dir: output_dir.into(), max_field_length }
    }

    fn validate(&self, exporter: &dyn Exporter, record: &CrsRecord) -> Result<(), ExportError> {
        let missing: Vec<&str> = exporter
            .required_fields()
            .iter()
            .copied()
            .filter(|field| record.text_field(field).is_none_or(str::is_empty))
            .collect();

        if !missing.is_empty() {
            return Err(ExportError::MissingFields {
                format: exporter.format(),
                fields: missing.join(", "),
            });
        }

        for field in ["srtext", "proj4text"] {
            if let Some(value) = record.text_field(field) {
                if value.len() > self.max_field_length {
                    return Err(ExportError::FieldTooLong {
                        field,
                        len: value.len(),
                        max: self.max_field_length,
                    });
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ExportService for FileExportService {
    async fn export(&self, format: ExportFormat, srid: i32) -> Result<ExportedFile, ExportError> {
        debug!("Exporting SRID {srid} as {format}");

        let record = self
            .storage
            .find_by_srid(srid)
            .await?
            .ok_or(ExportError::SridNotFound(srid))?;

        let exporter =
            self.exporters.get(&format).expect("all export formats have a registered exporter");

        self.validate(exporter.as_ref(), &record)?;

        let content = exporter.render(&record).await?;
        let file_name = exporter.file_name(&record);

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(&file_name);
        tokio::fs::write(&path, content).await?;

        info!("Exported SRID {srid} as {format} to {}", path.display());
        Ok(ExportedFile { path, file_name, format, srid })
    }
}

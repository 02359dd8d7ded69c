use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    export::{
        ExportError, ExportFormat, Exporter,
        prj::{self, GmVersion},
    },
    storage::{CrsRecord, CrsStorage},
};

/// Exports PRJ files for Global Mapper v20.
///
/// Registry systems are written as their normalized WKT; user-defined systems
/// get a detailed WKT generated from proj4 parameters with the rotation terms
/// negated, as v20 expects.
pub struct Gmv20Exporter {
    storage: Arc<dyn CrsStorage>,
}

impl Gmv20Exporter {
    pub fn new(storage: Arc<dyn CrsStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Exporter for Gmv20Exporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Gmv20Prj
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["srtext"]
    }

    async fn render(&self, record: &CrsRecord) -> Result<String, ExportError> {
        if record.is_custom() {
            return prj::custom_wkt(self.storage.as_ref(), record, GmVersion::V20).await;
        }
        Ok(prj::clean_wkt(record.srtext.as_deref().unwrap_or_default()))
    }

    fn file_name(&self, record: &CrsRecord) -> String {
        format!("{}.{}", prj::file_stem(record, Some(GmVersion::V20)), self.format().extension())
    }
}

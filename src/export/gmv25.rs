use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    export::{
        ExportError, ExportFormat, Exporter,
        prj::{self, GmVersion},
    },
    storage::{CrsRecord, CrsStorage},
};

/// Exports PRJ files for Global Mapper v25.
///
/// Unlike v20, the v25 release takes the `TOWGS84` rotation terms with the
/// proj4 sign convention, so generated WKT keeps them as-is.
pub struct Gmv25Exporter {
    storage: Arc<dyn CrsStorage>,
}

impl Gmv25Exporter {
    pub fn new(storage: Arc<dyn CrsStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Exporter for Gmv25Exporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Gmv25Prj
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["srtext", "proj4text"]
    }

    async fn render(&self, record: &CrsRecord) -> Result<String, ExportError> {
        if record.is_custom() {
            return prj::custom_wkt(self.storage.as_ref(), record, GmVersion::V25).await;
        }
        Ok(prj::clean_wkt(record.srtext.as_deref().unwrap_or_default()))
    }

    fn file_name(&self, record: &CrsRecord) -> String {
        format!("{}.{}", prj::file_stem(record, Some(GmVersion::V25)), self.format().extension())
    }
}

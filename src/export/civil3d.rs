use std::fmt::Write;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    export::{ExportError, ExportFormat, Exporter, prj},
    storage::CrsRecord,
};

const XMLNS: &str = "http://www.osgeo.org/mapguide/coordinatesystem";

/// Exports a coordinate system as a Civil3D XML document.
pub struct Civil3dExporter;

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn element(xml: &mut String, indent: &str, tag: &str, text: &str) {
    // Infallible for String, but write! keeps the formatting in one place.
    let _ = writeln!(xml, "{indent}<{tag}>{}</{tag}>", xml_escape(text));
}

#[async_trait]
impl Exporter for Civil3dExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Civil3dXml
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["srtext", "proj4text"]
    }

    async fn render(&self, record: &CrsRecord) -> Result<String, ExportError> {
        let auth_name = record.auth_name.as_deref().unwrap_or("CUSTOM");
        let auth_srid = record.auth_srid.unwrap_or(record.srid);

        let mut xml = String::new();
        let _ = writeln!(xml, "<CoordinateSystem xmlns=\"{XMLNS}\">");
        let _ = writeln!(xml, "  <Metadata>");
        element(&mut xml, "    ", "SRID", &record.srid.to_string());
        element(&mut xml, "    ", "AuthorityName", auth_name);
        element(&mut xml, "    ", "AuthoritySRID", &auth_srid.to_string());
        let _ = writeln!(xml, "  </Metadata>");
        element(&mut xml, "  ", "Definition", record.srtext.as_deref().unwrap_or_default());
        element(&mut xml, "  ", "Proj4", record.proj4text.as_deref().unwrap_or_default());
        element(&mut xml, "  ", "GenerationDate", &Utc::now().to_rfc3339());
        xml.push_str("</CoordinateSystem>\n");

        Ok(xml)
    }

    fn file_name(&self, record: &CrsRecord) -> String {
        format!("{}.{}", prj::file_stem(record, None), self.format().extension())
    }
}

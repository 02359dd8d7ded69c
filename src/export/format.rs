use std::{fmt, str::FromStr};

/// The downstream formats a coordinate system can be exported into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Civil3D coordinate system XML.
    Civil3dXml,
    /// Global Mapper v20 PRJ file.
    Gmv20Prj,
    /// Global Mapper v25 PRJ file.
    Gmv25Prj,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] =
        [ExportFormat::Civil3dXml, ExportFormat::Gmv20Prj, ExportFormat::Gmv25Prj];

    /// The stable format key, also used as the button label.
    pub fn key(self) -> &'static str {
        match self {
            ExportFormat::Civil3dXml => "xml_Civil3D",
            ExportFormat::Gmv20Prj => "prj_GMv20",
            ExportFormat::Gmv25Prj => "prj_GMv25",
        }
    }

    /// The short token carried in callback data (`export_{token}_{srid}`).
    pub fn callback_token(self) -> &'static str {
        match self {
            ExportFormat::Civil3dXml => "civil3d",
            ExportFormat::Gmv20Prj => "gmv20",
            ExportFormat::Gmv25Prj => "gmv25",
        }
    }

    pub fn from_callback_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.callback_token() == token)
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Civil3dXml => "xml",
            ExportFormat::Gmv20Prj | ExportFormat::Gmv25Prj => "prj",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown export format key: '{s}'"))
    }
}

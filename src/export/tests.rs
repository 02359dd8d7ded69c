use std::sync::Arc;

use mockall::predicate::eq;
use tempfile::TempDir;

use crate::{
    export::{ExportError, ExportFormat, ExportService, FileExportService},
    storage::{CrsRecord, Ellipsoid, MockCrsStorage},
};

fn epsg_record() -> CrsRecord {
    CrsRecord {
        srid: 32637,
        auth_name: Some("EPSG".to_string()),
        auth_srid: Some(32637),
        srtext: Some(r#"PROJCS["WGS 84 / UTM zone 37N"]"#.to_string()),
        proj4text: Some("+proj=utm +zone=37 +datum=WGS84 +units=m +no_defs".to_string()),
    }
}

fn custom_record() -> CrsRecord {
    CrsRecord {
        srid: 100012,
        auth_name: Some("custom".to_string()),
        auth_srid: Some(100012),
        srtext: Some("MSK 50 zone 2".to_string()),
        proj4text: Some(
            "+proj=tmerc +lat_0=0 +lon_0=37.5 +k=1 +x_0=2250000 +y_0=-5712900.566 \
             +ellps=krass +towgs84=1,2,3,0.1,0.2,0.3,0.5 +units=m +no_defs"
                .to_string(),
        ),
    }
}

fn krass() -> Ellipsoid {
    Ellipsoid {
        gm_id: "Krassowsky_1940".to_string(),
        semi_major: 6378245.0,
        inverse_flattening: 298.3,
    }
}

fn service(storage: MockCrsStorage, dir: &TempDir) -> FileExportService {
    FileExportService::new(Arc::new(storage), dir.path(), 4096)
}

#[tokio::test]
async fn test_export_civil3d_writes_file() {
    let mut storage = MockCrsStorage::new();
    storage
        .expect_find_by_srid()
        .with(eq(32637))
        .returning(|_| Ok(Some(epsg_record())));

    let dir = TempDir::new().unwrap();
    let exported = service(storage, &dir)
        .export(ExportFormat::Civil3dXml, 32637)
        .await
        .unwrap();

    assert_eq!(exported.file_name, "UTM_zone_37N.xml");
    assert_eq!(exported.format, ExportFormat::Civil3dXml);
    assert_eq!(exported.srid, 32637);
    assert_eq!(exported.path, dir.path().join("UTM_zone_37N.xml"));

    let content = tokio::fs::read_to_string(&exported.path).await.unwrap();
    assert!(content.contains("<SRID>32637</SRID>"));
    assert!(content.contains("<AuthorityName>EPSG</AuthorityName>"));
}

#[tokio::test]
async fn test_export_unknown_srid() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().with(eq(999)).returning(|_| Ok(None));

    let dir = TempDir::new().unwrap();
    let err = service(storage, &dir)
        .export(ExportFormat::Gmv20Prj, 999)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::SridNotFound(999)));
}

#[tokio::test]
async fn test_export_missing_required_field() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| {
        let mut record = epsg_record();
        record.proj4text = None;
        Ok(Some(record))
    });

    let dir = TempDir::new().unwrap();
    let err = service(storage, &dir)
        .export(ExportFormat::Gmv25Prj, 32637)
        .await
        .unwrap_err();

    match err {
        ExportError::MissingFields { format, fields } => {
            assert_eq!(format, ExportFormat::Gmv25Prj);
            assert_eq!(fields, "proj4text");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_export_empty_field_counts_as_missing() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| {
        let mut record = epsg_record();
        record.srtext = Some(String::new());
        Ok(Some(record))
    });

    let dir = TempDir::new().unwrap();
    let err = service(storage, &dir)
        .export(ExportFormat::Gmv20Prj, 32637)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::MissingFields { fields, .. } if fields == "srtext"));
}

#[tokio::test]
async fn test_export_field_too_long() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| {
        let mut record = epsg_record();
        record.srtext = Some("X".repeat(5000));
        Ok(Some(record))
    });

    let dir = TempDir::new().unwrap();
    let err = service(storage, &dir)
        .export(ExportFormat::Gmv20Prj, 32637)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExportError::FieldTooLong { field: "srtext", len: 5000, max: 4096 }
    ));
}

#[tokio::test]
async fn test_export_gmv20_flips_custom_rotations() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| Ok(Some(custom_record())));
    storage
        .expect_find_ellipsoid()
        .with(eq("krass"))
        .returning(|_| Ok(Some(krass())));
    storage
        .expect_find_datum_name()
        .with(eq("+towgs84=1,2,3,0.1,0.2,0.3,0.5"))
        .returning(|_| Ok(Some("SK-42".to_string())));

    let dir = TempDir::new().unwrap();
    let exported = service(storage, &dir)
        .export(ExportFormat::Gmv20Prj, 100012)
        .await
        .unwrap();

    assert_eq!(exported.file_name, "MSK_50_zone_2_v20.prj");

    let content = tokio::fs::read_to_string(&exported.path).await.unwrap();
    assert!(content.contains("DATUM[\"SK-42\""));
    assert!(content.contains("SPHEROID[\"Krassowsky_1940\",6378245,298.3]"));
    assert!(content.contains(
        "TOWGS84[1.000000000,2.000000000,3.000000000,\
         -0.100000000000,-0.200000000000,-0.300000000000,0.500000000000000]"
    ));
}

#[tokio::test]
async fn test_export_gmv25_keeps_custom_rotations() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| Ok(Some(custom_record())));
    storage.expect_find_ellipsoid().returning(|_| Ok(Some(krass())));
    storage.expect_find_datum_name().returning(|_| Ok(None));

    let dir = TempDir::new().unwrap();
    let exported = service(storage, &dir)
        .export(ExportFormat::Gmv25Prj, 100012)
        .await
        .unwrap();

    assert_eq!(exported.file_name, "MSK_50_zone_2_v25.prj");

    let content = tokio::fs::read_to_string(&exported.path).await.unwrap();
    assert!(content.contains("Custom_Datum_100012"));
    assert!(content.contains(
        "TOWGS84[1.000000000,2.000000000,3.000000000,\
         0.100000000000,0.200000000000,0.300000000000,0.500000000000000]"
    ));
}

#[tokio::test]
async fn test_export_gmv25_registry_uses_cleaned_wkt() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| {
        let mut record = epsg_record();
        record.srtext = Some("PROJCS[ \"WGS 84 / UTM zone 37N\",\n  UNIT[\"m\", 1]]".to_string());
        Ok(Some(record))
    });

    let dir = TempDir::new().unwrap();
    let exported = service(storage, &dir)
        .export(ExportFormat::Gmv25Prj, 32637)
        .await
        .unwrap();

    let content = tokio::fs::read_to_string(&exported.path).await.unwrap();
    assert_eq!(content, "PROJCS[\"WGS 84 / UTM zone 37N\",UNIT[\"m\",1]]");
}

#[tokio::test]
async fn test_export_custom_without_towgs84() {
    let mut storage = MockCrsStorage::new();
    storage.expect_find_by_srid().returning(|_| {
        let mut record = custom_record();
        record.proj4text = Some("+proj=tmerc +lon_0=37.5 +ellps=krass".to_string());
        Ok(Some(record))
    });

    let dir = TempDir::new().unwrap();
    let err = service(storage, &dir)
        .export(ExportFormat::Gmv20Prj, 100012)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExportError::WktGeneration { srid: 100012, reason } if reason.contains("towgs84")
    ));
}

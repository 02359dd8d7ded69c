use super::*;

fn record() -> CrsRecord {
    CrsRecord {
        srid: 32637,
        auth_name: Some("EPSG".to_string()),
        auth_srid: Some(32637),
        srtext: Some(r#"PROJCS["WGS 84 / UTM zone 37N"]"#.to_string()),
        proj4text: Some("+proj=utm +zone=37 +datum=WGS84".to_string()),
    }
}

#[test]
fn test_format_record_details() {
    let text = TelegramMessagingService::format_record_details(&record());

    assert!(text.starts_with("🌐 <b>WGS 84 / UTM zone 37N</b>"));
    assert!(text.contains("SRID: <code>32637</code>"));
    assert!(text.contains("PROJCS[&quot;WGS 84 / UTM zone 37N&quot;]"));
    assert!(text.contains("+proj=utm +zone=37 +datum=WGS84"));
    assert!(text.ends_with("Choose an export format:"));
}

#[test]
fn test_format_record_details_skips_empty_fields() {
    let mut r = record();
    r.srtext = Some(String::new());
    r.proj4text = None;

    let text = TelegramMessagingService::format_record_details(&r);
    assert!(!text.contains("WKT:"));
    assert!(!text.contains("proj4:"));
}

#[test]
fn test_format_point_matches() {
    let coords = Coordinates::new(55.75, 37.61).unwrap();
    let matches = vec![
        PointMatch {
            srid: 100012,
            name: "MSK 50 zone 2".to_string(),
            info: Some("Moscow region".to_string()),
            projected: Some((2_205_123.456, 6_200_987.654)),
        },
        PointMatch { srid: 32637, name: "UTM zone 37N".to_string(), info: None, projected: None },
    ];

    let text = TelegramMessagingService::format_point_matches(coords, &matches);

    assert!(text.contains("<code>55.75;37.61</code>"));
    assert!(text.contains("<b>MSK 50 zone 2</b> (SRID <code>100012</code>)"));
    assert!(text.contains("Moscow region"));
    assert!(text.contains("x = 2205123.456, y = 6200987.654"));
    assert!(text.contains("<b>UTM zone 37N</b>"));
    assert!(text.contains("(point could not be projected)"));
}

#[test]
fn test_excerpt_truncates_long_definitions() {
    let short = "PROJCS".to_string();
    assert_eq!(excerpt(&short), short);

    let long = "x".repeat(MAX_DEFINITION_EXCERPT + 50);
    let cut = excerpt(&long);
    assert_eq!(cut.chars().count(), MAX_DEFINITION_EXCERPT + 1);
    assert!(cut.ends_with('…'));
}

#[test]
fn test_search_results_keyboard_callback_data() {
    let keyboard = build_search_results_keyboard(&[record()]);

    let button = &keyboard.inline_keyboard[0][0];
    assert_eq!(button.text, "32637 (WGS 84 / UTM zone 37N)");
    assert_eq!(
        button.kind,
        teloxide::types::InlineKeyboardButtonKind::CallbackData("crs_32637".to_string())
    );
}

#[test]
fn test_export_keyboard_callback_data() {
    let keyboard = build_export_keyboard(100012);

    let data: Vec<_> = keyboard
        .inline_keyboard
        .iter()
        .map(|row| match &row[0].kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
            other => panic!("unexpected button kind: {other:?}"),
        })
        .collect();

    assert_eq!(data, vec!["export_civil3d_100012", "export_gmv20_100012", "export_gmv25_100012"]);

    let labels: Vec<_> =
        keyboard.inline_keyboard.iter().map(|row| row[0].text.as_str()).collect();
    assert_eq!(labels, vec!["xml_Civil3D", "prj_GMv20", "prj_GMv25"]);
}

use jsonlive_parser::{
    decode_jsonlive, normalize, parse_unit_value, DecodeError, FieldParseError, UNKNOWN_VALUE,
};
use types::RawSnapshot;

#[test]
fn decode_and_normalize_fixture() {
    let data = include_bytes!("fixtures/jsonlive.json");
    let raw = decode_jsonlive(data).expect("decode");
    assert_eq!(raw.set_ac_power, 420);
    assert_eq!(raw.ac_power, "450 W");

    let (snapshot, diagnostics) = normalize(&raw);
    assert_eq!(snapshot.voltage_grid, 230.1);
    assert_eq!(snapshot.voltage_battery, 52.3);
    assert_eq!(snapshot.temperature, 31);
    assert_eq!(snapshot.meter_readout, 87);
    assert_eq!(snapshot.total_energy, 1234.5);
    assert_eq!(snapshot.ac_power, 450.0);
    assert_eq!(snapshot.ac_power_sun2, 148.5);
    assert_eq!(snapshot.zero_export_control_power, 455.0);
    assert_eq!(snapshot.meter_power, 12.25);
    assert_eq!(snapshot.sun2_round_trip, 12.0);
    assert_eq!(snapshot.wifi_state, 1);
    assert_eq!(snapshot.wifi_rssi, 2);

    // SUN3ROUNDTRIP is empty and ACPOWERSUN3 is "-" in the fixture.
    assert_eq!(snapshot.sun3_round_trip, UNKNOWN_VALUE);
    assert_eq!(snapshot.ac_power_sun3, UNKNOWN_VALUE);
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn partial_document_keeps_zero_values_and_sentinels() {
    let data = include_bytes!("fixtures/jsonlive-partial.json");
    let raw = decode_jsonlive(data).expect("decode");
    assert_eq!(raw.voltage_battery, 0.0);
    assert_eq!(raw.power_limit, 0);
    assert_eq!(raw.meter_power, "");

    let (snapshot, diagnostics) = normalize(&raw);
    assert_eq!(snapshot.voltage_grid, 229.4);
    assert_eq!(snapshot.ac_power, UNKNOWN_VALUE);
    assert_eq!(snapshot.meter_power, UNKNOWN_VALUE);
    // Unknown labels fall back to ordinal 0.
    assert_eq!(snapshot.wifi_state, 0);
    assert_eq!(snapshot.wifi_rssi, 0);
    assert_eq!(diagnostics.len(), 9);
    assert!(diagnostics.contains(&FieldParseError::UnknownLabel {
        key: "RSSI",
        raw: "Very Good".to_string(),
    }));
}

#[test]
fn unit_values_parse_leading_number() {
    assert_eq!(parse_unit_value("123.4 W").expect("parse"), 123.4);
    assert_eq!(parse_unit_value("-42 W").expect("parse"), -42.0);
    assert_eq!(parse_unit_value("7").expect("parse"), 7.0);
    assert_eq!(parse_unit_value("0.5\tkWh").expect("parse"), 0.5);
    assert!(parse_unit_value("").is_err());
    assert!(parse_unit_value("W 12").is_err());
    assert!(parse_unit_value(" 12 W").is_err());
}

#[test]
fn wifi_state_mapping() {
    let mut raw = RawSnapshot {
        wifi_state: "CONNECTED".to_string(),
        ..RawSnapshot::default()
    };
    assert_eq!(normalize(&raw).0.wifi_state, 1);

    raw.wifi_state = "DISCONNECTED".to_string();
    assert_eq!(normalize(&raw).0.wifi_state, 0);

    raw.wifi_state = "AP_MODE".to_string();
    let (snapshot, diagnostics) = normalize(&raw);
    assert_eq!(snapshot.wifi_state, 0);
    assert!(diagnostics.contains(&FieldParseError::UnknownLabel {
        key: "WIFI",
        raw: "AP_MODE".to_string(),
    }));
}

#[test]
fn signal_quality_mapping() {
    let cases = [
        ("Unusable", 0),
        ("Not good", 1),
        ("Okay", 2),
        ("Very good", 3),
        ("Amazing", 4),
        ("Very Good", 0),
    ];
    for (label, expected) in cases {
        let raw = RawSnapshot {
            wifi_rssi: label.to_string(),
            ..RawSnapshot::default()
        };
        assert_eq!(normalize(&raw).0.wifi_rssi, expected, "label {label}");
    }
}

#[test]
fn decode_rejects_malformed_documents() {
    assert!(matches!(
        decode_jsonlive(b"{\"VGRID\": 230"),
        Err(DecodeError::Json(_))
    ));
    assert!(matches!(
        decode_jsonlive(b"[1, 2, 3]"),
        Err(DecodeError::NotAnObject)
    ));
    assert!(matches!(
        decode_jsonlive(b"{\"VGRID\": \"230 V\"}"),
        Err(DecodeError::FieldType { key: "VGRID", .. })
    ));
    assert!(matches!(
        decode_jsonlive(b"{\"TEMP\": 31.5}"),
        Err(DecodeError::FieldType { key: "TEMP", .. })
    ));
    assert!(matches!(
        decode_jsonlive(b"{\"ACPOWER\": 450}"),
        Err(DecodeError::FieldType { key: "ACPOWER", .. })
    ));
}

#[test]
fn integer_valued_floats_are_accepted() {
    let raw = decode_jsonlive(b"{\"VGRID\": 230, \"DAYENERGY\": 2}").expect("decode");
    assert_eq!(raw.voltage_grid, 230.0);
    assert_eq!(raw.day_energy, 2.0);
}

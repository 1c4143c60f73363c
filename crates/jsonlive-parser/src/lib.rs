use std::num::ParseFloatError;

use serde_json::{Map, Value};
use thiserror::Error;
use types::{NormalizedSnapshot, RawSnapshot, SignalQuality, WifiState};

/// Value emitted for a unit-suffixed field whose number could not be read.
pub const UNKNOWN_VALUE: f64 = -1.0;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("jsonlive document is not an object")]
    NotAnObject,
    #[error("key {key} must be {expected}")]
    FieldType {
        key: &'static str,
        expected: &'static str,
    },
}

/// A single field that could not be normalized. The rest of the snapshot is
/// still usable.
#[derive(Debug, Error, PartialEq)]
pub enum FieldParseError {
    #[error("failed to extract number from key {key} ({raw:?}): {source}")]
    UnitValue {
        key: &'static str,
        raw: String,
        source: ParseFloatError,
    },
    #[error("unknown label {raw:?} for key {key}")]
    UnknownLabel { key: &'static str, raw: String },
}

/// Decodes a `/jsonlive` body. Unknown keys are ignored; missing keys and
/// `null` keep the zero value.
pub fn decode_jsonlive(body: &[u8]) -> Result<RawSnapshot, DecodeError> {
    let document: Value = serde_json::from_slice(body)?;
    let map = document.as_object().ok_or(DecodeError::NotAnObject)?;

    Ok(RawSnapshot {
        voltage_grid: float_field(map, "VGRID")?,
        voltage_battery: float_field(map, "VBAT")?,
        set_ac_power: int_field(map, "SETACPOWER")?,
        temperature: int_field(map, "TEMP")?,
        power_limit: int_field(map, "POWERLIMIT")?,
        sun2_round_trip: text_field(map, "SUN2ROUNDTRIP")?,
        sun2_set_point: int_field(map, "SUN2SETPOINT")?,
        sun2_power_limit: int_field(map, "SUN2POWERLIMIT")?,
        sun3_round_trip: text_field(map, "SUN3ROUNDTRIP")?,
        sun3_set_point: int_field(map, "SUN3SETPOINT")?,
        sun3_power_limit: int_field(map, "SUN3POWERLIMIT")?,
        meter_readout: int_field(map, "METERREADOUT")?,
        day_energy: float_field(map, "DAYENERGY")?,
        total_energy: float_field(map, "TOTALENERGY")?,
        meter_day_energy: float_field(map, "METERDAYENERGY")?,
        ac_power: text_field(map, "ACPOWER")?,
        ac_power_sun2: text_field(map, "ACPOWERSUN2")?,
        ac_power_sun3: text_field(map, "ACPOWERSUN3")?,
        zero_export_control_power: text_field(map, "ZEPCPOWER")?,
        meter_power: text_field(map, "METERPOWER")?,
        wifi_state: text_field(map, "WIFI")?,
        wifi_rssi: text_field(map, "RSSI")?,
    })
}

fn float_field(map: &Map<String, Value>, key: &'static str) -> Result<f64, DecodeError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value.as_f64().ok_or(DecodeError::FieldType {
            key,
            expected: "a number",
        }),
    }
}

fn int_field(map: &Map<String, Value>, key: &'static str) -> Result<i64, DecodeError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value.as_i64().ok_or(DecodeError::FieldType {
            key,
            expected: "an integer",
        }),
    }
}

fn text_field(map: &Map<String, Value>, key: &'static str) -> Result<String, DecodeError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(DecodeError::FieldType {
            key,
            expected: "a string",
        }),
    }
}

/// Reads the number in front of the unit in values such as `"123.4 W"`.
/// Only the text before the first whitespace character is considered, so a
/// value with leading whitespace has an empty number and fails.
pub fn parse_unit_value(raw: &str) -> Result<f64, ParseFloatError> {
    let number = raw.split(char::is_whitespace).next().unwrap_or_default();
    number.parse::<f64>()
}

/// Converts a decoded record into its numeric form. Field failures are
/// collected rather than returned early; the snapshot is always complete.
pub fn normalize(raw: &RawSnapshot) -> (NormalizedSnapshot, Vec<FieldParseError>) {
    let mut diagnostics = Vec::new();
    let mut unit = |key: &'static str, value: &str| match parse_unit_value(value) {
        Ok(parsed) => parsed,
        Err(source) => {
            diagnostics.push(FieldParseError::UnitValue {
                key,
                raw: value.to_string(),
                source,
            });
            UNKNOWN_VALUE
        }
    };

    let sun2_round_trip = unit("SUN2ROUNDTRIP", &raw.sun2_round_trip);
    let sun3_round_trip = unit("SUN3ROUNDTRIP", &raw.sun3_round_trip);
    let ac_power = unit("ACPOWER", &raw.ac_power);
    let ac_power_sun2 = unit("ACPOWERSUN2", &raw.ac_power_sun2);
    let ac_power_sun3 = unit("ACPOWERSUN3", &raw.ac_power_sun3);
    let zero_export_control_power = unit("ZEPCPOWER", &raw.zero_export_control_power);
    let meter_power = unit("METERPOWER", &raw.meter_power);

    let wifi_state = match WifiState::from_label(&raw.wifi_state) {
        Some(state) => state.ordinal(),
        None => {
            diagnostics.push(FieldParseError::UnknownLabel {
                key: "WIFI",
                raw: raw.wifi_state.clone(),
            });
            0
        }
    };
    let wifi_rssi = match SignalQuality::from_label(&raw.wifi_rssi) {
        Some(quality) => quality.ordinal(),
        None => {
            diagnostics.push(FieldParseError::UnknownLabel {
                key: "RSSI",
                raw: raw.wifi_rssi.clone(),
            });
            0
        }
    };

    let snapshot = NormalizedSnapshot {
        voltage_grid: raw.voltage_grid,
        voltage_battery: raw.voltage_battery,
        set_ac_power: raw.set_ac_power,
        temperature: raw.temperature,
        power_limit: raw.power_limit,
        sun2_round_trip,
        sun2_set_point: raw.sun2_set_point,
        sun2_power_limit: raw.sun2_power_limit,
        sun3_round_trip,
        sun3_set_point: raw.sun3_set_point,
        sun3_power_limit: raw.sun3_power_limit,
        meter_readout: raw.meter_readout,
        day_energy: raw.day_energy,
        total_energy: raw.total_energy,
        meter_day_energy: raw.meter_day_energy,
        ac_power,
        ac_power_sun2,
        ac_power_sun3,
        zero_export_control_power,
        meter_power,
        wifi_state,
        wifi_rssi,
    };

    (snapshot, diagnostics)
}

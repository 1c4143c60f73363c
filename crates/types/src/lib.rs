/// Record decoded from the device's `/jsonlive` document before any unit or
/// enum handling. Missing keys leave the zero value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    pub voltage_grid: f64,
    pub voltage_battery: f64,
    pub set_ac_power: i64,
    pub temperature: i64,
    pub power_limit: i64,
    pub sun2_round_trip: String,
    pub sun2_set_point: i64,
    pub sun2_power_limit: i64,
    pub sun3_round_trip: String,
    pub sun3_set_point: i64,
    pub sun3_power_limit: i64,
    pub meter_readout: i64,
    pub day_energy: f64,
    pub total_energy: f64,
    pub meter_day_energy: f64,
    pub ac_power: String,
    pub ac_power_sun2: String,
    pub ac_power_sun3: String,
    pub zero_export_control_power: String,
    pub meter_power: String,
    pub wifi_state: String,
    pub wifi_rssi: String,
}

/// Fully numeric view of one poll. Fields that failed to parse carry a
/// sentinel (`-1.0` for unit values, `0` for ordinals) instead of being absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSnapshot {
    pub voltage_grid: f64,
    pub voltage_battery: f64,
    pub set_ac_power: i64,
    pub temperature: i64,
    pub power_limit: i64,
    pub sun2_round_trip: f64,
    pub sun2_set_point: i64,
    pub sun2_power_limit: i64,
    pub sun3_round_trip: f64,
    pub sun3_set_point: i64,
    pub sun3_power_limit: i64,
    pub meter_readout: i64,
    pub day_energy: f64,
    pub total_energy: f64,
    pub meter_day_energy: f64,
    pub ac_power: f64,
    pub ac_power_sun2: f64,
    pub ac_power_sun3: f64,
    pub zero_export_control_power: f64,
    pub meter_power: f64,
    pub wifi_state: u8,
    pub wifi_rssi: u8,
}

/// Connection state reported in the `WIFI` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
}

impl WifiState {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "DISCONNECTED" => Some(Self::Disconnected),
            "CONNECTED" => Some(Self::Connected),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connected => 1,
        }
    }
}

/// Qualitative signal label reported in the `RSSI` key, ordered worst to best.
/// Labels match case-sensitively; "Very Good" is not "Very good".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalQuality {
    Unusable,
    NotGood,
    Okay,
    VeryGood,
    Amazing,
}

impl SignalQuality {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Unusable" => Some(Self::Unusable),
            "Not good" => Some(Self::NotGood),
            "Okay" => Some(Self::Okay),
            "Very good" => Some(Self::VeryGood),
            "Amazing" => Some(Self::Amazing),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

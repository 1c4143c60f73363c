mod process;

use std::sync::Arc;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tokio::sync::Mutex;
use tracing::debug;
use types::NormalizedSnapshot;

use crate::process::ProcessSampler;
pub use crate::process::{
    PROCESS_CPU_USAGE, PROCESS_GAUGES, PROCESS_RESIDENT_MEMORY, PROCESS_START_TIME,
    PROCESS_VIRTUAL_MEMORY,
};

pub const VOLTAGE_GRID: &str = "trucki_voltage_grid";
pub const VOLTAGE_BATTERY: &str = "trucki_voltage_battery";
pub const SET_AC_POWER: &str = "trucki_set_ac_power";
pub const INVERTER_TEMPERATURE: &str = "trucki_inverter_temperature";
pub const POWER_LIMIT: &str = "trucki_power_limit";
pub const SUN_2_ROUND_TRIP: &str = "trucki_sun_2_round_trip";
pub const SUN_2_SET_POINT: &str = "trucki_sun_2_set_point";
pub const SUN_2_POWER_LIMIT: &str = "trucki_sun_2_power_limit";
pub const SUN_3_ROUND_TRIP: &str = "trucki_sun_3_round_trip";
pub const SUN_3_SET_POINT: &str = "trucki_sun_3_set_point";
pub const SUN_3_POWER_LIMIT: &str = "trucki_sun_3_power_limit";
pub const POWER_METER_READOUT: &str = "trucki_power_meter_readout";
pub const DAY_ENERGY_GRID_OUTPUT: &str = "trucki_day_energy_grid_output";
pub const TOTAL_ENERGY_GRID_OUTPUT: &str = "trucki_total_energy_grid_output";
pub const POWER_METER_DAY_ENERGY: &str = "trucki_power_meter_day_energy";
pub const INVERTER_AC_POWER_OUTPUT: &str = "trucki_inverter_ac_power_output";
pub const SUN_2_AC_POWER_OUTPUT: &str = "trucki_sun_2_ac_power_output";
pub const SUN_3_AC_POWER_OUTPUT: &str = "trucki_sun_3_ac_power_output";
pub const ZERO_EXPORT_CONTROL_POWER: &str = "trucki_zero_export_control_power";
pub const POWER_METER_POWER: &str = "trucki_power_meter_power";
pub const WIFI_STATE: &str = "trucki_wifi_state";
pub const WIFI_RSSI: &str = "trucki_wifi_rssi";

/// Every gauge the exporter declares, with its HELP text.
pub const GAUGES: [(&str, &str); 22] = [
    (VOLTAGE_GRID, "AC grid voltage (V) measured by the inverter"),
    (VOLTAGE_BATTERY, "DC battery voltage (V) measured by the inverter"),
    (SET_AC_POWER, "AC output target (W) set by the Trucki stick"),
    (INVERTER_TEMPERATURE, "Inverter temperature (°C)"),
    (POWER_LIMIT, "Inverter AC output limit (W) set by the Trucki stick"),
    (SUN_2_ROUND_TRIP, "Packet round trip time (ms) to the second inverter (sun2)"),
    (SUN_2_SET_POINT, "Grid set point (W) of the second inverter (sun2)"),
    (SUN_2_POWER_LIMIT, "Maximum power limit (W) of the second inverter (sun2)"),
    (SUN_3_ROUND_TRIP, "Packet round trip time (ms) to the third inverter (sun3)"),
    (SUN_3_SET_POINT, "Grid set point (W) of the third inverter (sun3)"),
    (SUN_3_POWER_LIMIT, "Maximum power limit (W) of the third inverter (sun3)"),
    (POWER_METER_READOUT, "Packet round trip time (ms) to the power meter"),
    (DAY_ENERGY_GRID_OUTPUT, "Energy (kWh) fed to the grid since the start of the calendar day"),
    (TOTAL_ENERGY_GRID_OUTPUT, "Total energy (kWh) fed to the grid"),
    (POWER_METER_DAY_ENERGY, "Energy (kWh) drawn from the grid today according to the power meter"),
    (INVERTER_AC_POWER_OUTPUT, "AC power (W) fed to the grid by the inverter, -1 if unreadable"),
    (SUN_2_AC_POWER_OUTPUT, "AC power (W) of the second inverter (sun2), -1 if unreadable"),
    (SUN_3_AC_POWER_OUTPUT, "AC power (W) of the third inverter (sun3), -1 if unreadable"),
    (ZERO_EXPORT_CONTROL_POWER, "Zero export control output power (W) calculated by the Trucki stick, -1 if unreadable"),
    (POWER_METER_POWER, "Power (W) measured by the power meter, -1 if unreadable"),
    (WIFI_STATE, "WiFi state of the Trucki stick: 0 disconnected, 1 connected"),
    (WIFI_RSSI, "WiFi signal quality: 0 unusable, 1 not good, 2 okay, 3 very good, 4 amazing"),
];

/// Gauge values written on every publish. The sun2/sun3 round trip gauges are
/// declared but intentionally absent here.
pub fn published_values(snapshot: &NormalizedSnapshot) -> [(&'static str, f64); 20] {
    [
        (VOLTAGE_GRID, snapshot.voltage_grid),
        (VOLTAGE_BATTERY, snapshot.voltage_battery),
        (SET_AC_POWER, snapshot.set_ac_power as f64),
        (INVERTER_TEMPERATURE, snapshot.temperature as f64),
        (POWER_LIMIT, snapshot.power_limit as f64),
        (SUN_2_SET_POINT, snapshot.sun2_set_point as f64),
        (SUN_2_POWER_LIMIT, snapshot.sun2_power_limit as f64),
        (SUN_3_SET_POINT, snapshot.sun3_set_point as f64),
        (SUN_3_POWER_LIMIT, snapshot.sun3_power_limit as f64),
        (POWER_METER_READOUT, snapshot.meter_readout as f64),
        (DAY_ENERGY_GRID_OUTPUT, snapshot.day_energy),
        (TOTAL_ENERGY_GRID_OUTPUT, snapshot.total_energy),
        (POWER_METER_DAY_ENERGY, snapshot.meter_day_energy),
        (INVERTER_AC_POWER_OUTPUT, snapshot.ac_power),
        (SUN_2_AC_POWER_OUTPUT, snapshot.ac_power_sun2),
        (SUN_3_AC_POWER_OUTPUT, snapshot.ac_power_sun3),
        (ZERO_EXPORT_CONTROL_POWER, snapshot.zero_export_control_power),
        (POWER_METER_POWER, snapshot.meter_power),
        (WIFI_STATE, f64::from(snapshot.wifi_state)),
        (WIFI_RSSI, f64::from(snapshot.wifi_rssi)),
    ]
}

/// Owns the Prometheus recorder the exporter's gauges live in. The recorder
/// is private to the publisher rather than installed globally.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<Inner>,
}

struct Inner {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    // Held for the whole publish+render; also owns the process sampler.
    render_lock: Mutex<ProcessSampler>,
}

impl Publisher {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            for (name, help) in GAUGES.into_iter().chain(PROCESS_GAUGES) {
                metrics::describe_gauge!(name, help);
                // Registering starts every gauge at zero.
                let _ = metrics::gauge!(name);
            }
        });

        Self {
            inner: Arc::new(Inner {
                recorder,
                handle,
                render_lock: Mutex::new(ProcessSampler::new()),
            }),
        }
    }

    /// Writes `snapshot` (if any) and fresh process figures into the gauges
    /// and renders the exposition text. Requests are serialized so a render
    /// never mixes two snapshots.
    pub async fn render(&self, snapshot: Option<&NormalizedSnapshot>) -> String {
        let mut sampler = self.inner.render_lock.lock().await;
        match snapshot {
            Some(snapshot) => self.set_gauges(published_values(snapshot)),
            None => debug!("no snapshot yet, rendering initial gauge values"),
        }
        if let Some(values) = sampler.sample() {
            self.set_gauges(values);
        }
        self.inner.handle.render()
    }

    fn set_gauges<const N: usize>(&self, values: [(&'static str, f64); N]) {
        metrics::with_local_recorder(&self.inner.recorder, || {
            for (name, value) in values {
                metrics::gauge!(name).set(value);
            }
        });
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::warn;

pub const PROCESS_RESIDENT_MEMORY: &str = "process_resident_memory_bytes";
pub const PROCESS_VIRTUAL_MEMORY: &str = "process_virtual_memory_bytes";
pub const PROCESS_START_TIME: &str = "process_start_time_seconds";
pub const PROCESS_CPU_USAGE: &str = "process_cpu_usage_percent";

/// Gauges describing the exporter process itself.
pub const PROCESS_GAUGES: [(&str, &str); 4] = [
    (PROCESS_RESIDENT_MEMORY, "Resident memory size in bytes"),
    (PROCESS_VIRTUAL_MEMORY, "Virtual memory size in bytes"),
    (PROCESS_START_TIME, "Start time of the process since unix epoch in seconds"),
    (PROCESS_CPU_USAGE, "CPU usage of the process since the previous scrape, in percent of one core"),
];

/// Samples the exporter's own process. Only the current pid is refreshed.
pub(crate) struct ProcessSampler {
    system: System,
    pid: Option<Pid>,
}

impl ProcessSampler {
    pub(crate) fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                warn!(error = err, "process metrics unavailable on this platform");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }

    /// Returns `None` when the process could not be inspected.
    pub(crate) fn sample(&mut self) -> Option<[(&'static str, f64); 4]> {
        let pid = self.pid?;
        self.system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = self.system.process(pid)?;
        Some([
            (PROCESS_RESIDENT_MEMORY, process.memory() as f64),
            (PROCESS_VIRTUAL_MEMORY, process.virtual_memory() as f64),
            (PROCESS_START_TIME, process.start_time() as f64),
            (PROCESS_CPU_USAGE, f64::from(process.cpu_usage())),
        ])
    }
}

//! systemd readiness and watchdog notifications. Everything here is a no-op
//! off Linux or when the unit was not started with `Type=notify`.

use std::future::pending;
use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};
#[cfg(target_os = "linux")]
use tracing::warn;
use tracing::info;

const MIN_PING_INTERVAL: Duration = Duration::from_millis(100);

/// Pings at half the watchdog timeout, never more often than every 100 ms.
pub fn ping_interval(timeout: Duration) -> Duration {
    (timeout / 2).max(MIN_PING_INTERVAL)
}

/// Ping schedule for the systemd watchdog, driven from the main select loop
/// so pings stop as soon as the exporter starts shutting down.
pub struct Watchdog {
    ticker: Option<Interval>,
}

impl Watchdog {
    /// Must be called from within the runtime.
    pub fn from_env() -> Self {
        match watchdog_timeout() {
            Some(timeout) => Self::every(ping_interval(timeout)),
            None => Self::disabled(),
        }
    }

    pub fn every(period: Duration) -> Self {
        info!(period_ms = period.as_millis() as u64, "systemd watchdog enabled");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker: Some(ticker),
        }
    }

    pub fn disabled() -> Self {
        Self { ticker: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.ticker.is_some()
    }

    /// Resolves at the next ping deadline. Never resolves when disabled.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => pending::<()>().await,
        }
    }

    pub fn ping(&self) {
        #[cfg(target_os = "linux")]
        send(&[sd_notify::NotifyState::Watchdog], "watchdog");
    }
}

pub fn notify_ready() {
    #[cfg(target_os = "linux")]
    send(&[sd_notify::NotifyState::Ready], "ready");
}

pub fn notify_stopping() {
    #[cfg(target_os = "linux")]
    send(&[sd_notify::NotifyState::Stopping], "stopping");
}

// NOTIFY_SOCKET stays set so later watchdog pings still reach systemd.
#[cfg(target_os = "linux")]
fn send(states: &[sd_notify::NotifyState], kind: &'static str) {
    if let Err(err) = sd_notify::notify(false, states) {
        warn!(error = %err, kind, "systemd notify failed");
    }
}

#[cfg(target_os = "linux")]
fn watchdog_timeout() -> Option<Duration> {
    let mut usec = 0;
    sd_notify::watchdog_enabled(false, &mut usec).then(|| Duration::from_micros(usec))
}

#[cfg(not(target_os = "linux"))]
fn watchdog_timeout() -> Option<Duration> {
    None
}

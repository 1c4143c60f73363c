use std::time::Duration;

use exporter_app::systemd::{ping_interval, Watchdog};
use tokio::time::timeout;

#[test]
fn ping_interval_is_half_the_watchdog_timeout() {
    assert_eq!(ping_interval(Duration::from_secs(30)), Duration::from_secs(15));
    assert_eq!(ping_interval(Duration::from_millis(150)), Duration::from_millis(100));
    assert_eq!(ping_interval(Duration::ZERO), Duration::from_millis(100));
}

#[tokio::test]
async fn disabled_watchdog_never_ticks() {
    let mut watchdog = Watchdog::disabled();
    assert!(!watchdog.is_enabled());
    assert!(timeout(Duration::from_millis(50), watchdog.tick()).await.is_err());
}

#[tokio::test]
async fn enabled_watchdog_ticks_on_its_period() {
    let mut watchdog = Watchdog::every(Duration::from_millis(20));
    assert!(watchdog.is_enabled());
    for _ in 0..3 {
        timeout(Duration::from_secs(1), watchdog.tick())
            .await
            .expect("tick");
    }
}

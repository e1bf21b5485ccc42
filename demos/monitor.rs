use activity_tap::{DefaultBackend, Monitor, MonitorConfig, StdoutSink};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    let mut monitor = Monitor::with_sink(
        DefaultBackend::default(),
        MonitorConfig::from_env(),
        Arc::new(StdoutSink),
    );
    monitor.start();
    for _ in 0..10 {
        thread::sleep(Duration::from_secs(1));
        println!(
            "keys: {}, mouse: {}, idle: {}s",
            monitor.keyboard_count(),
            monitor.mouse_count(),
            monitor.idle_seconds()
        );
    }
    if let Err(error) = monitor.save_activity_log("activity.csv") {
        println!("Error: {}", error);
    }
    monitor.stop();
}

//! Keyboard and mouse activity accounting on top of an [`EventTap`].
//!
//! A worker thread owns the tap and pumps its run loop; the counters are
//! shared atomics that any thread may read.

mod counters;
mod keys;

pub use self::counters::{unix_now, ActivityCounters, ActivitySnapshot};
pub use self::keys::KeyTracker;

use crate::config::MonitorConfig;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::gateway::{Backend, EventTap, Gateway};
use crate::tap::{Disposition, EventKind, TapEvent, TapHandler};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid activity log path")]
    InvalidPath,
    #[error("failed to write activity log: {0}")]
    Io(#[from] io::Error),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Turns intercepted events into counter updates. Never alters events.
pub struct ActivityHandler {
    counters: Arc<ActivityCounters>,
    keys: Arc<Mutex<KeyTracker>>,
}

impl ActivityHandler {
    pub fn new(
        counters: Arc<ActivityCounters>,
        keys: Arc<Mutex<KeyTracker>>,
    ) -> ActivityHandler {
        ActivityHandler { counters, keys }
    }

    pub fn observe(&self, kind: EventKind, key_code: Option<u16>, now: Instant, unix: u64) {
        match kind {
            EventKind::KeyDown => {
                if lock(&self.keys).press(key_code.unwrap_or(0), now) {
                    self.counters.record_keyboard();
                    self.counters.mark_activity(unix);
                }
            }
            EventKind::KeyUp => lock(&self.keys).release(key_code.unwrap_or(0)),
            kind if kind.is_pointer() || kind == EventKind::ScrollWheel => {
                self.counters.record_mouse();
                self.counters.mark_activity(unix);
            }
            _ => {}
        }
    }
}

impl TapHandler for ActivityHandler {
    fn handle(&mut self, event: &TapEvent) -> Disposition {
        self.observe(event.kind, event.key_code, Instant::now(), unix_now());
        Disposition::Pass
    }
}

struct Worker<B: Backend> {
    gateway: Gateway<B>,
    config: MonitorConfig,
    counters: Arc<ActivityCounters>,
    keys: Arc<Mutex<KeyTracker>>,
    running: Arc<AtomicBool>,
}

impl<B: Backend + 'static> Worker<B> {
    fn run(self) {
        let handler = ActivityHandler::new(self.counters.clone(), self.keys.clone());
        let tap = match EventTap::open(&self.gateway, handler) {
            Ok(tap) => tap,
            Err(error) => {
                log::warn!(target: "activity_tap", "monitor worker exiting: {}", error);
                return;
            }
        };
        tap.attach_to_current_run_loop();
        tap.set_enabled(true);

        let pump = self.config.pump_interval.as_secs_f64();
        let mut last_sweep = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            self.gateway.run_loop_with_timeout(pump);
            let now = Instant::now();
            if now.duration_since(last_sweep) > self.config.stale_key_sweep {
                lock(&self.keys).sweep(now);
                last_sweep = now;
            }
            thread::sleep(self.config.idle_sleep);
        }

        tap.close();
        log::debug!(target: "activity_tap", "monitor worker stopped");
    }
}

/// Counts keyboard and mouse activity while started.
pub struct Monitor<B> {
    backend: B,
    sink: Arc<dyn DiagnosticSink>,
    config: MonitorConfig,
    counters: Arc<ActivityCounters>,
    keys: Arc<Mutex<KeyTracker>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<B: Backend + Send + 'static> Monitor<B> {
    pub fn new(backend: B, config: MonitorConfig) -> Monitor<B> {
        Monitor::with_sink(backend, config, Arc::new(LogSink))
    }

    pub fn with_sink(
        backend: B,
        config: MonitorConfig,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Monitor<B> {
        let keys = KeyTracker::new(config.key_repeat_timeout);
        Monitor {
            backend,
            sink,
            config,
            counters: Arc::new(ActivityCounters::default()),
            keys: Arc::new(Mutex::new(keys)),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Resets the counters and starts the worker thread. Returns false if
    /// already running.
    ///
    /// A tap the system declines does not make this fail: the worker
    /// reports it and exits, and the monitor stays started.
    pub fn start(&mut self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.reset_counters();
        let worker = Worker {
            gateway: Gateway::with_sink(self.backend.clone(), self.sink.clone()),
            config: self.config.clone(),
            counters: self.counters.clone(),
            keys: self.keys.clone(),
            running: self.running.clone(),
        };
        let spawned = thread::Builder::new()
            .name("activity-tap".into())
            .spawn(move || worker.run());
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                log::info!(target: "activity_tap", "monitoring started");
                true
            }
            Err(error) => {
                log::error!(target: "activity_tap", "cannot spawn monitor thread: {}", error);
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }
}

impl<B> Monitor<B> {
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn counters(&self) -> Arc<ActivityCounters> {
        self.counters.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops and joins the worker, then forgets held keys. Returns false
    /// if not running.
    pub fn stop(&mut self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!(target: "activity_tap", "monitor worker panicked");
            }
        }
        lock(&self.keys).clear();
        log::info!(target: "activity_tap", "monitoring stopped");
        true
    }

    pub fn keyboard_count(&self) -> u64 {
        self.counters.keyboard()
    }

    pub fn mouse_count(&self) -> u64 {
        self.counters.mouse()
    }

    pub fn idle_seconds(&self) -> u64 {
        self.counters.idle_seconds_at(unix_now())
    }

    /// Keys seen going down whose key-up has not arrived yet.
    pub fn held_keys(&self) -> usize {
        lock(&self.keys).len()
    }

    /// Zeroes both counts, marks now as the last activity and forgets
    /// held keys.
    pub fn reset_counters(&self) {
        self.counters.reset_at(unix_now());
        lock(&self.keys).clear();
    }

    /// Appends the current totals to a CSV file, writing the header when
    /// the file is new, then resets the counters.
    pub fn save_activity_log<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ActivitySnapshot, MonitorError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(MonitorError::InvalidPath);
        }
        let snapshot = self.counters.snapshot_at(unix_now());
        let existed = path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if !existed {
            writeln!(file, "{}", ActivitySnapshot::CSV_HEADER)?;
        }
        writeln!(file, "{}", snapshot.csv_row())?;
        self.reset_counters();
        Ok(snapshot)
    }
}

impl<B> Drop for Monitor<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

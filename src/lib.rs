//! Thin gateway over the macOS event-tap API, plus a keyboard/mouse
//! activity monitor built on it.
//!
//! The [`Gateway`] forwards one-to-one to the system: create a tap, enable or
//! disable it, attach it to the current run loop, pump that run loop, and read
//! key codes or the cursor position. Absent handles and null events are
//! no-ops rather than faults.
//!
//! ```no_run
//! use activity_tap::{DefaultBackend, Disposition, EventKind, EventTap, Gateway, TapEvent};
//!
//! let gateway = Gateway::new(DefaultBackend::default());
//! let tap = EventTap::open(&gateway, |event: &TapEvent| {
//!     if event.kind == EventKind::KeyDown {
//!         println!("key {:?}", event.key_code);
//!     }
//!     Disposition::Pass
//! })
//! .expect("accessibility permission is required");
//! tap.attach_to_current_run_loop();
//! tap.set_enabled(true);
//! for _ in 0..100 {
//!     gateway.run_loop_with_timeout(0.1);
//! }
//! tap.close();
//! ```
//!
//! [`Monitor`] runs the same thing on a worker thread and keeps counts:
//!
//! ```no_run
//! use activity_tap::{DefaultBackend, Monitor, MonitorConfig};
//!
//! let mut monitor = Monitor::new(DefaultBackend::default(), MonitorConfig::from_env());
//! monitor.start();
//! std::thread::sleep(std::time::Duration::from_secs(10));
//! println!("{} keys, {} mouse events", monitor.keyboard_count(), monitor.mouse_count());
//! monitor.save_activity_log("activity.csv").ok();
//! monitor.stop();
//! ```

mod config;
mod diagnostics;
pub mod ffi;
mod gateway;
mod macos;
mod monitor;
mod tap;
#[cfg(test)]
mod testing;
mod unsupported;

pub use crate::config::MonitorConfig;
pub use crate::diagnostics::{DiagnosticSink, LogSink, NullSink, StdoutSink};
pub use crate::gateway::{Backend, EventTap, Gateway};
pub use crate::monitor::{
    unix_now, ActivityCounters, ActivityHandler, ActivitySnapshot, KeyTracker, Monitor,
    MonitorError,
};
pub use crate::tap::{
    Disposition, EventKind, EventMask, OwnedEvent, Point, RawCallback, RawEvent, RawProxy, RawTap,
    RunLoopExit, TapError, TapEvent, TapHandle, TapHandler, DEFAULT_EVENT_MASK,
};
pub use crate::unsupported::UnsupportedBackend;

#[cfg(target_os = "macos")]
pub use crate::macos::MacBackend;

/// The backend for the target being built.
#[cfg(target_os = "macos")]
pub type DefaultBackend = MacBackend;
/// The backend for the target being built.
#[cfg(not(target_os = "macos"))]
pub type DefaultBackend = UnsupportedBackend;

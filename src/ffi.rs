//! C ABI.
//!
//! The monitor functions work on every target. On macOS the raw event-tap
//! functions are exported as well, under the names and signatures native
//! callers already link against.

use crate::config::MonitorConfig;
use crate::diagnostics::StdoutSink;
use crate::monitor::Monitor;
use crate::DefaultBackend;
use lazy_static::lazy_static;
use std::slice;
use std::str;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

lazy_static! {
    static ref MONITOR: Mutex<Monitor<DefaultBackend>> = Mutex::new(Monitor::with_sink(
        DefaultBackend::default(),
        MonitorConfig::from_env(),
        Arc::new(StdoutSink),
    ));
}

fn monitor() -> MutexGuard<'static, Monitor<DefaultBackend>> {
    MONITOR.lock().unwrap_or_else(PoisonError::into_inner)
}

#[no_mangle]
pub extern "C" fn start_monitoring() -> bool {
    monitor().start()
}

#[no_mangle]
pub extern "C" fn stop_monitoring() -> bool {
    monitor().stop()
}

#[no_mangle]
pub extern "C" fn get_keyboard_count() -> u64 {
    monitor().keyboard_count()
}

#[no_mangle]
pub extern "C" fn get_mouse_count() -> u64 {
    monitor().mouse_count()
}

#[no_mangle]
pub extern "C" fn get_idle_time() -> u64 {
    monitor().idle_seconds()
}

#[no_mangle]
pub extern "C" fn reset_counters() {
    monitor().reset_counters();
}

/// `path_ptr` must point to `path_len` bytes of UTF-8, or be null.
#[no_mangle]
pub unsafe extern "C" fn save_activity_log(path_ptr: *const u8, path_len: usize) -> bool {
    if path_ptr.is_null() {
        return false;
    }
    let bytes = slice::from_raw_parts(path_ptr, path_len);
    let path = match str::from_utf8(bytes) {
        Ok(path) => path,
        Err(_) => return false,
    };
    match monitor().save_activity_log(path) {
        Ok(_) => true,
        Err(error) => {
            log::warn!(target: "activity_tap", "{}", error);
            false
        }
    }
}

#[cfg(target_os = "macos")]
#[allow(non_snake_case)]
mod shim {
    use crate::diagnostics::StdoutSink;
    use crate::gateway::Gateway;
    use crate::macos::MacBackend;
    use crate::tap::{EventKind, Point, RawCallback, RawEvent, TapHandle};
    use lazy_static::lazy_static;
    use std::os::raw::{c_int, c_void};
    use std::sync::Arc;

    lazy_static! {
        static ref GATEWAY: Gateway<MacBackend> =
            Gateway::with_sink(MacBackend, Arc::new(StdoutSink));
    }

    #[no_mangle]
    pub unsafe extern "C" fn InitializeEventTap(
        callback: RawCallback,
        user_data: *mut c_void,
    ) -> *mut c_void {
        GATEWAY.initialize(callback, user_data).as_raw()
    }

    #[no_mangle]
    pub unsafe extern "C" fn EnableEventTap(tap: *mut c_void, enable: bool) {
        GATEWAY.set_enabled(TapHandle::from_raw(tap), enable);
    }

    #[no_mangle]
    pub unsafe extern "C" fn AddEventTapToCurrentRunLoop(tap: *mut c_void) {
        GATEWAY.attach_to_current_run_loop(TapHandle::from_raw(tap));
    }

    #[no_mangle]
    pub unsafe extern "C" fn CleanupEventTap(tap: *mut c_void) {
        GATEWAY.cleanup(TapHandle::from_raw(tap));
    }

    #[no_mangle]
    pub extern "C" fn RunCurrentRunLoopWithTimeout(seconds: f64) -> c_int {
        GATEWAY.run_loop_with_timeout(seconds).code()
    }

    #[no_mangle]
    pub unsafe extern "C" fn GetKeyCodeFromEvent(event: RawEvent) -> u16 {
        GATEWAY.key_code_of(event)
    }

    #[no_mangle]
    pub unsafe extern "C" fn GetCurrentMousePos(point: *mut Point) -> c_int {
        GATEWAY.write_pointer_position(point)
    }

    #[no_mangle]
    pub unsafe extern "C" fn PrintEventInfo(event_type: u32, event: RawEvent) {
        GATEWAY.debug_print(EventKind::from_raw(event_type), event);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::ptr;

    // every assertion on the process-wide monitor lives here so tests
    // running in parallel cannot interleave
    #[test]
    fn test_monitor_exports() {
        reset_counters();
        assert_eq!(get_keyboard_count(), 0);
        assert_eq!(get_mouse_count(), 0);
        assert!(get_idle_time() <= 1);
        assert!(!stop_monitoring());

        unsafe {
            assert!(!save_activity_log(ptr::null(), 4));
            let invalid = [0xff_u8, 0xfe, 0x2e];
            assert!(!save_activity_log(invalid.as_ptr(), invalid.len()));
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let path = path.to_str().unwrap();
        assert!(unsafe { save_activity_log(path.as_ptr(), path.len()) });
        let contents = fs::read_to_string(path).unwrap();
        let header = "timestamp,keyboard_count,mouse_count,idle_time_seconds";
        assert_eq!(contents.lines().next(), Some(header));
        assert_eq!(contents.lines().count(), 2);
    }
}

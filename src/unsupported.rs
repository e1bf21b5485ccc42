use crate::gateway::Backend;
use crate::tap::{EventMask, Point, RawCallback, RawEvent, RawTap, RunLoopExit};
use std::os::raw::c_void;
use std::ptr;

/// Used where the crate has no event-tap implementation: every tap is
/// declined and the run loop reports that it has no sources.
#[derive(Debug, Default, Copy, Clone)]
pub struct UnsupportedBackend;

impl Backend for UnsupportedBackend {
    unsafe fn create_tap(
        &self,
        _mask: EventMask,
        _callback: RawCallback,
        _user_info: *mut c_void,
    ) -> RawTap {
        ptr::null_mut()
    }

    unsafe fn enable_tap(&self, _tap: RawTap, _enabled: bool) {}

    unsafe fn invalidate_tap(&self, _tap: RawTap) {}

    unsafe fn add_to_current_run_loop(&self, _tap: RawTap) -> bool {
        false
    }

    fn run_current_run_loop(&self, _seconds: f64) -> i32 {
        RunLoopExit::Finished.code()
    }

    unsafe fn key_code(&self, _event: RawEvent) -> i64 {
        0
    }

    unsafe fn location(&self, _event: RawEvent) -> Point {
        Point::default()
    }

    fn create_query_event(&self) -> RawEvent {
        ptr::null_mut()
    }

    unsafe fn release(&self, _object: *mut c_void) {}
}

use crate::gateway::Backend;
use crate::macos::common::*;
use crate::tap::{EventMask, Point, RawCallback, RawEvent, RawTap};
use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopSource};
use core_foundation_sys::base::{kCFAllocatorDefault, CFRelease};
use core_foundation_sys::mach_port::{CFMachPortCreateRunLoopSource, CFMachPortRef};
use core_foundation_sys::runloop::CFRunLoopRunInMode;
use core_graphics::event::{CGEventTapLocation, EventField};
use std::os::raw::c_void;
use std::ptr;

/// Forwards to CoreGraphics and CoreFoundation.
#[derive(Debug, Default, Copy, Clone)]
pub struct MacBackend;

impl Backend for MacBackend {
    unsafe fn create_tap(
        &self,
        mask: EventMask,
        callback: RawCallback,
        user_info: *mut c_void,
    ) -> RawTap {
        CGEventTapCreate(
            CGEventTapLocation::Session,
            kCGHeadInsertEventTap,
            CGEventTapOption::Default,
            mask.bits(),
            callback,
            user_info,
        ) as RawTap
    }

    unsafe fn enable_tap(&self, tap: RawTap, enabled: bool) {
        CGEventTapEnable(tap as CFMachPortRef, enabled);
    }

    unsafe fn invalidate_tap(&self, tap: RawTap) {
        CFMachPortInvalidate(tap as CFMachPortRef);
    }

    unsafe fn add_to_current_run_loop(&self, tap: RawTap) -> bool {
        let source = CFMachPortCreateRunLoopSource(kCFAllocatorDefault, tap as CFMachPortRef, 0);
        if source.is_null() {
            return false;
        }
        // the run loop keeps its own reference; ours goes when `source` drops
        let source = CFRunLoopSource::wrap_under_create_rule(source);
        CFRunLoop::get_current().add_source(&source, kCFRunLoopDefaultMode);
        true
    }

    fn run_current_run_loop(&self, seconds: f64) -> i32 {
        unsafe { CFRunLoopRunInMode(kCFRunLoopDefaultMode, seconds, kReturnAfterSourceHandled) }
    }

    unsafe fn key_code(&self, event: RawEvent) -> i64 {
        CGEventGetIntegerValueField(event, EventField::KEYBOARD_EVENT_KEYCODE)
    }

    unsafe fn location(&self, event: RawEvent) -> Point {
        let point = CGEventGetLocation(event);
        Point {
            x: point.x,
            y: point.y,
        }
    }

    fn create_query_event(&self) -> RawEvent {
        unsafe { CGEventCreate(ptr::null()) }
    }

    unsafe fn release(&self, object: *mut c_void) {
        CFRelease(object as *const c_void);
    }
}

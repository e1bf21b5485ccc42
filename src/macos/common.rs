#![allow(clippy::upper_case_acronyms)]
use crate::tap::{RawCallback, RawEvent};
use core_foundation_sys::mach_port::CFMachPortRef;
use core_graphics::event::CGEventTapLocation;
use core_graphics::geometry::CGPoint;
use std::os::raw::c_void;

pub type CGEventSourceRef = *const c_void;
// https://developer.apple.com/documentation/coregraphics/cgeventfield?language=objc
pub type CGEventField = u32;
// https://developer.apple.com/documentation/coregraphics/cgeventmask?language=objc
pub type CGEventMask = u64;

// https://developer.apple.com/documentation/coregraphics/cgeventtapplacement?language=objc
pub type CGEventTapPlacement = u32;
#[allow(non_upper_case_globals)]
pub const kCGHeadInsertEventTap: CGEventTapPlacement = 0;

// https://developer.apple.com/documentation/coregraphics/cgeventtapoptions?language=objc
#[allow(dead_code)]
#[repr(u32)]
pub enum CGEventTapOption {
    Default = 0,
    ListenOnly = 1,
}

// CFRunLoopRunInMode takes a Boolean (unsigned char)
#[allow(non_upper_case_globals)]
pub const kReturnAfterSourceHandled: u8 = 1;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    #[allow(improper_ctypes)]
    pub fn CGEventTapCreate(
        tap: CGEventTapLocation,
        place: CGEventTapPlacement,
        options: CGEventTapOption,
        eventsOfInterest: CGEventMask,
        callback: RawCallback,
        user_info: *mut c_void,
    ) -> CFMachPortRef;
    pub fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    pub fn CGEventCreate(source: CGEventSourceRef) -> RawEvent;
    pub fn CGEventGetIntegerValueField(event: RawEvent, field: CGEventField) -> i64;
    pub fn CGEventGetLocation(event: RawEvent) -> CGPoint;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    pub fn CFMachPortInvalidate(port: CFMachPortRef);
}

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::raw::c_void;
use std::ptr;

/// Opaque pointer to an OS-owned event record.
pub type RawEvent = *mut c_void;
/// Opaque pointer to an OS-owned interception point (a `CFMachPortRef` on macOS).
pub type RawTap = *mut c_void;
/// Opaque token handed to the callback by the OS.
pub type RawProxy = *mut c_void;

/// Callback signature expected by the OS when an event tap fires.
/// Returning null suppresses the event.
pub type RawCallback = unsafe extern "C" fn(
    proxy: RawProxy,
    event_type: u32,
    event: RawEvent,
    user_info: *mut c_void,
) -> RawEvent;

/// Category of an intercepted event.
///
/// Values mirror `CGEventType`.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Null,
    LeftMouseDown,
    LeftMouseUp,
    RightMouseDown,
    RightMouseUp,
    MouseMoved,
    LeftMouseDragged,
    RightMouseDragged,
    KeyDown,
    KeyUp,
    FlagsChanged,
    ScrollWheel,
    TapDisabledByTimeout,
    TapDisabledByUserInput,
    Other(u32),
}

impl EventKind {
    pub fn from_raw(value: u32) -> EventKind {
        use EventKind::*;
        match value {
            0 => Null,
            1 => LeftMouseDown,
            2 => LeftMouseUp,
            3 => RightMouseDown,
            4 => RightMouseUp,
            5 => MouseMoved,
            6 => LeftMouseDragged,
            7 => RightMouseDragged,
            10 => KeyDown,
            11 => KeyUp,
            12 => FlagsChanged,
            22 => ScrollWheel,
            0xFFFF_FFFE => TapDisabledByTimeout,
            0xFFFF_FFFF => TapDisabledByUserInput,
            other => Other(other),
        }
    }

    pub fn as_raw(self) -> u32 {
        use EventKind::*;
        match self {
            Null => 0,
            LeftMouseDown => 1,
            LeftMouseUp => 2,
            RightMouseDown => 3,
            RightMouseUp => 4,
            MouseMoved => 5,
            LeftMouseDragged => 6,
            RightMouseDragged => 7,
            KeyDown => 10,
            KeyUp => 11,
            FlagsChanged => 12,
            ScrollWheel => 22,
            TapDisabledByTimeout => 0xFFFF_FFFE,
            TapDisabledByUserInput => 0xFFFF_FFFF,
            Other(value) => value,
        }
    }

    /// Key down or key up.
    pub fn is_keyboard(self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::KeyUp)
    }

    /// Button presses, releases and plain moves. Scrolling is not a
    /// pointer event here because it carries no meaningful location.
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            EventKind::LeftMouseDown
                | EventKind::LeftMouseUp
                | EventKind::RightMouseDown
                | EventKind::RightMouseUp
                | EventKind::MouseMoved
        )
    }
}

/// Bitset of event categories a tap receives.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EventMask(pub u64);

impl EventMask {
    /// The mask bit for a raw event type. Types past the width of the mask
    /// (the tap-disabled notifications among them) have none.
    pub const fn bit(kind: u32) -> u64 {
        if kind < 64 { 1 << kind } else { 0 }
    }

    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & EventMask::bit(kind.as_raw()) != 0
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

/// Key down/up, left/right button down/up, mouse moved and scroll wheel.
pub const DEFAULT_EVENT_MASK: EventMask = EventMask(
    EventMask::bit(10)
        | EventMask::bit(11)
        | EventMask::bit(1)
        | EventMask::bit(2)
        | EventMask::bit(3)
        | EventMask::bit(4)
        | EventMask::bit(5)
        | EventMask::bit(22),
);

/// Why a run-loop pump returned. Values mirror `CFRunLoopRunResult`.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunLoopExit {
    Finished,
    Stopped,
    TimedOut,
    HandledSource,
    Other(i32),
}

impl RunLoopExit {
    pub fn from_code(code: i32) -> RunLoopExit {
        match code {
            1 => RunLoopExit::Finished,
            2 => RunLoopExit::Stopped,
            3 => RunLoopExit::TimedOut,
            4 => RunLoopExit::HandledSource,
            other => RunLoopExit::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            RunLoopExit::Finished => 1,
            RunLoopExit::Stopped => 2,
            RunLoopExit::TimedOut => 3,
            RunLoopExit::HandledSource => 4,
            RunLoopExit::Other(code) => code,
        }
    }
}

/// Screen coordinates in points. Layout-compatible with `CGPoint`.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Handle to a live tap, or the absent sentinel.
///
/// Copyable on purpose: it is a plain token, the lifetime is managed
/// explicitly through [`crate::Gateway::cleanup`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TapHandle(RawTap);

impl TapHandle {
    pub const ABSENT: TapHandle = TapHandle(ptr::null_mut());

    pub fn from_raw(raw: RawTap) -> TapHandle {
        TapHandle(raw)
    }

    pub fn as_raw(self) -> RawTap {
        self.0
    }

    pub fn is_absent(self) -> bool {
        self.0.is_null()
    }
}

impl Default for TapHandle {
    fn default() -> Self {
        TapHandle::ABSENT
    }
}

/// One intercepted event, with the fields a handler usually needs
/// already extracted.
#[derive(Debug)]
pub struct TapEvent {
    pub kind: EventKind,
    /// Hardware key code, for key down/up.
    pub key_code: Option<u16>,
    /// Cursor location, for pointer events.
    pub location: Option<Point>,
    raw: RawEvent,
}

impl TapEvent {
    pub(crate) fn new(
        kind: EventKind,
        key_code: Option<u16>,
        location: Option<Point>,
        raw: RawEvent,
    ) -> TapEvent {
        TapEvent {
            kind,
            key_code,
            location,
            raw,
        }
    }

    /// The OS record. Only valid for the duration of the callback.
    pub fn raw(&self) -> RawEvent {
        self.raw
    }
}

/// What the OS should do with an event after the handler saw it.
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    Pass,
    Suppress,
    /// Deliver another record instead. Only built by
    /// [`Disposition::replace`].
    Replace(OwnedEvent),
}

impl Disposition {
    /// Delivers `raw` in place of the intercepted event. A null `raw`
    /// suppresses the event.
    ///
    /// The system releases the replacement after delivering it, along
    /// with the original.
    ///
    /// # Safety
    /// `raw` must be null or a valid event record holding a retain the
    /// caller owns (freshly created, or retained for this purpose). That
    /// retain passes to the system: the caller must not release `raw` or
    /// use it afterwards. The record handed to the handler in
    /// [`TapEvent::raw`] is borrowed and never qualifies.
    ///
    /// ```compile_fail
    /// use activity_tap::{Disposition, OwnedEvent};
    ///
    /// let forged = Disposition::Replace(OwnedEvent(0xdead as *mut _));
    /// ```
    pub unsafe fn replace(raw: RawEvent) -> Disposition {
        if raw.is_null() {
            return Disposition::Suppress;
        }
        Disposition::Replace(OwnedEvent(raw))
    }
}

/// An event record carrying one retain for the system.
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedEvent(RawEvent);

impl OwnedEvent {
    pub fn as_raw(&self) -> RawEvent {
        self.0
    }

    /// Gives up the retain to whoever receives the pointer.
    pub(crate) fn into_raw(self) -> RawEvent {
        self.0
    }
}

/// Receives every event a tap intercepts.
pub trait TapHandler {
    fn handle(&mut self, event: &TapEvent) -> Disposition;
}

impl<F> TapHandler for F
where
    F: FnMut(&TapEvent) -> Disposition,
{
    fn handle(&mut self, event: &TapEvent) -> Disposition {
        self(event)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TapError {
    /// The OS declined the tap, usually because the process lacks
    /// accessibility permission.
    #[error("the system declined to create the event tap")]
    CreateFailed,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kind_reversible() {
        for raw in (0..64).chain([0xFFFF_FFFE, 0xFFFF_FFFF]) {
            assert_eq!(EventKind::from_raw(raw).as_raw(), raw);
        }
    }

    #[test]
    fn test_default_mask() {
        use EventKind::*;
        for kind in [
            KeyDown,
            KeyUp,
            LeftMouseDown,
            LeftMouseUp,
            RightMouseDown,
            RightMouseUp,
            MouseMoved,
            ScrollWheel,
        ] {
            assert!(DEFAULT_EVENT_MASK.contains(kind), "{:?}", kind);
        }
        for kind in [FlagsChanged, LeftMouseDragged, Null, TapDisabledByTimeout] {
            assert!(!DEFAULT_EVENT_MASK.contains(kind), "{:?}", kind);
        }
        assert_eq!(DEFAULT_EVENT_MASK.bits(), 0x0040_0C3E);
    }

    #[test]
    fn test_mask_bit_out_of_range() {
        assert_eq!(EventMask::bit(63), 1u64 << 63);
        assert_eq!(EventMask::bit(64), 0);
        assert_eq!(EventMask::bit(0xFFFF_FFFF), 0);
        let full = EventMask(u64::MAX);
        assert!(full.contains(EventKind::Other(63)));
        assert!(!full.contains(EventKind::Other(64)));
        assert!(!full.contains(EventKind::TapDisabledByUserInput));
    }

    #[test]
    fn test_null_replacement_suppresses() {
        assert_eq!(
            unsafe { Disposition::replace(ptr::null_mut()) },
            Disposition::Suppress
        );
    }

    #[test]
    fn test_run_loop_codes() {
        assert_eq!(RunLoopExit::from_code(3), RunLoopExit::TimedOut);
        assert_eq!(RunLoopExit::from_code(4).code(), 4);
        assert_eq!(RunLoopExit::from_code(-7), RunLoopExit::Other(-7));
    }

    #[test]
    fn test_point_display() {
        let point = Point { x: 1.5, y: -2.0 };
        assert_eq!(point.to_string(), "(1.500000, -2.000000)");
    }
}

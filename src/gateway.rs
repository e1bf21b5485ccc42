use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::tap::{
    Disposition, EventKind, EventMask, Point, RawCallback, RawEvent, RawProxy, RawTap,
    RunLoopExit, TapError, TapEvent, TapHandle, TapHandler, DEFAULT_EVENT_MASK,
};
use log::Level;
use std::fmt;
use std::os::raw::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

/// The system calls the gateway forwards to.
///
/// Implementations are thin: null checks and sentinel handling live in
/// [`Gateway`], not here.
pub trait Backend: Clone {
    /// Returns null when the system declines the tap.
    unsafe fn create_tap(
        &self,
        mask: EventMask,
        callback: RawCallback,
        user_info: *mut c_void,
    ) -> RawTap;
    unsafe fn enable_tap(&self, tap: RawTap, enabled: bool);
    /// Detaches the tap from every run loop it was added to.
    unsafe fn invalidate_tap(&self, tap: RawTap);
    /// Returns false when no run-loop source could be created.
    unsafe fn add_to_current_run_loop(&self, tap: RawTap) -> bool;
    fn run_current_run_loop(&self, seconds: f64) -> i32;
    unsafe fn key_code(&self, event: RawEvent) -> i64;
    unsafe fn location(&self, event: RawEvent) -> Point;
    /// A fresh, empty event owned by the caller, or null.
    fn create_query_event(&self) -> RawEvent;
    unsafe fn release(&self, object: *mut c_void);
}

/// Null-checked forwarding layer over a [`Backend`].
#[derive(Clone)]
pub struct Gateway<B> {
    backend: B,
    sink: Arc<dyn DiagnosticSink>,
}

impl<B: Backend> Gateway<B> {
    pub fn new(backend: B) -> Gateway<B> {
        Gateway::with_sink(backend, Arc::new(LogSink))
    }

    pub fn with_sink(backend: B, sink: Arc<dyn DiagnosticSink>) -> Gateway<B> {
        Gateway { backend, sink }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn report(&self, level: Level, message: fmt::Arguments<'_>) {
        self.sink.line(level, message);
    }

    /// Creates a session-level tap at the head of the event chain for
    /// [`DEFAULT_EVENT_MASK`]. On refusal, emits one diagnostic line and
    /// returns [`TapHandle::ABSENT`].
    ///
    /// # Safety
    /// `callback` is called with `user_info` for every matching event until
    /// the tap is cleaned up; `user_info` must stay valid for that long.
    pub unsafe fn initialize(&self, callback: RawCallback, user_info: *mut c_void) -> TapHandle {
        let mask = DEFAULT_EVENT_MASK;
        let raw = self.backend.create_tap(mask, callback, user_info);
        if raw.is_null() {
            self.report(Level::Error, format_args!("Failed to create event tap."));
            return TapHandle::ABSENT;
        }
        TapHandle::from_raw(raw)
    }

    /// # Safety
    /// `handle` must be absent or live (not yet cleaned up).
    pub unsafe fn set_enabled(&self, handle: TapHandle, enabled: bool) {
        if handle.is_absent() {
            return;
        }
        self.backend.enable_tap(handle.as_raw(), enabled);
    }

    /// # Safety
    /// `handle` must be absent or live.
    pub unsafe fn attach_to_current_run_loop(&self, handle: TapHandle) {
        if handle.is_absent() {
            return;
        }
        if !self.backend.add_to_current_run_loop(handle.as_raw()) {
            log::trace!(target: "activity_tap", "no run loop source for {:?}", handle);
        }
    }

    /// Pumps the calling thread's run loop in the default mode, returning
    /// after the first handled source or after `seconds`.
    pub fn run_loop_with_timeout(&self, seconds: f64) -> RunLoopExit {
        let seconds = if seconds.is_nan() || seconds < 0.0 {
            0.0
        } else {
            seconds
        };
        RunLoopExit::from_code(self.backend.run_current_run_loop(seconds))
    }

    /// Returns 0 for a null event.
    ///
    /// # Safety
    /// `event` must be null or a valid keyboard event record.
    pub unsafe fn key_code_of(&self, event: RawEvent) -> u16 {
        if event.is_null() {
            return 0;
        }
        self.backend.key_code(event) as u16
    }

    pub fn current_pointer_position(&self) -> Option<Point> {
        let event = self.backend.create_query_event();
        if event.is_null() {
            return None;
        }
        unsafe {
            let point = self.backend.location(event);
            self.backend.release(event);
            Some(point)
        }
    }

    /// Writes the cursor position through `out`. Returns 0 on success and
    /// -1 when `out` is null or no position is available.
    ///
    /// # Safety
    /// `out` must be null or valid for writes.
    pub unsafe fn write_pointer_position(&self, out: *mut Point) -> i32 {
        if out.is_null() {
            return -1;
        }
        match self.current_pointer_position() {
            Some(point) => {
                ptr::write(out, point);
                0
            }
            None => -1,
        }
    }

    /// Releases the tap. Run-loop sources built from it are not removed.
    ///
    /// # Safety
    /// `handle` must be absent or live, and must not be used afterwards.
    pub unsafe fn cleanup(&self, handle: TapHandle) {
        if handle.is_absent() {
            return;
        }
        self.backend.release(handle.as_raw());
    }

    /// # Safety
    /// `event` must be null or a valid event record of category `kind`.
    pub unsafe fn debug_print(&self, kind: EventKind, event: RawEvent) {
        let raw_kind = kind.as_raw() as i32;
        self.report(Level::Debug, format_args!("Event type: {}", raw_kind));
        if event.is_null() {
            return;
        }
        if kind.is_keyboard() {
            let code = self.backend.key_code(event) as u16;
            self.report(Level::Debug, format_args!("Key code: {}", code));
        } else if kind.is_pointer() {
            let location = self.backend.location(event);
            self.report(Level::Debug, format_args!("Mouse location: {}", location));
        }
    }
}

struct HandlerContext<B> {
    backend: B,
    handler: Box<dyn TapHandler>,
}

unsafe extern "C" fn trampoline<B: Backend>(
    _proxy: RawProxy,
    event_type: u32,
    event: RawEvent,
    user_info: *mut c_void,
) -> RawEvent {
    if user_info.is_null() {
        return event;
    }
    let context = &mut *(user_info as *mut HandlerContext<B>);
    let kind = EventKind::from_raw(event_type);
    let mut key_code = None;
    let mut location = None;
    if !event.is_null() {
        if kind.is_keyboard() {
            key_code = Some(context.backend.key_code(event) as u16);
        } else if kind.is_pointer() {
            location = Some(context.backend.location(event));
        }
    }
    let tap_event = TapEvent::new(kind, key_code, location, event);
    let handler = &mut context.handler;
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&tap_event))) {
        Ok(Disposition::Pass) => event,
        Ok(Disposition::Suppress) => ptr::null_mut(),
        Ok(Disposition::Replace(other)) => other.into_raw(),
        Err(_) => {
            log::error!(target: "activity_tap", "tap handler panicked on {:?}", kind);
            event
        }
    }
}

/// A tap owning its handler.
///
/// There is no `Drop`: call [`EventTap::close`] to release the tap and the
/// handler.
pub struct EventTap<B: Backend> {
    gateway: Gateway<B>,
    handle: TapHandle,
    context: *mut HandlerContext<B>,
}

impl<B: Backend + 'static> EventTap<B> {
    pub fn open<H>(gateway: &Gateway<B>, handler: H) -> Result<EventTap<B>, TapError>
    where
        H: TapHandler + 'static,
    {
        let context = Box::into_raw(Box::new(HandlerContext {
            backend: gateway.backend.clone(),
            handler: Box::new(handler),
        }));
        let handle = unsafe { gateway.initialize(trampoline::<B>, context as *mut c_void) };
        if handle.is_absent() {
            unsafe { drop(Box::from_raw(context)) };
            return Err(TapError::CreateFailed);
        }
        Ok(EventTap {
            gateway: gateway.clone(),
            handle,
            context,
        })
    }

    pub fn handle(&self) -> TapHandle {
        self.handle
    }

    pub fn set_enabled(&self, enabled: bool) {
        unsafe { self.gateway.set_enabled(self.handle, enabled) }
    }

    pub fn attach_to_current_run_loop(&self) {
        unsafe { self.gateway.attach_to_current_run_loop(self.handle) }
    }

    /// Disables and detaches the tap before releasing it, so the handler
    /// can be freed safely.
    pub fn close(self) {
        unsafe {
            self.gateway.set_enabled(self.handle, false);
            self.gateway.backend.invalidate_tap(self.handle.as_raw());
            self.gateway.cleanup(self.handle);
            drop(Box::from_raw(self.context));
        }
    }
}

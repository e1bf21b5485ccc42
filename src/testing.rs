//! Scripted stand-in for the OS, used by the unit tests.

use crate::diagnostics::DiagnosticSink;
use crate::gateway::Backend;
use crate::tap::{EventKind, EventMask, Point, RawCallback, RawEvent, RawTap};
use log::Level;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default)]
pub struct FakeEvent {
    pub key_code: i64,
    pub location: Point,
}

impl FakeEvent {
    pub fn key(key_code: i64) -> FakeEvent {
        FakeEvent {
            key_code,
            ..Default::default()
        }
    }

    pub fn at(x: f64, y: f64) -> FakeEvent {
        FakeEvent {
            location: Point { x, y },
            ..Default::default()
        }
    }
}

struct FakeTap {
    mask: EventMask,
    callback: RawCallback,
    user_info: *mut c_void,
    // taps come up enabled, as they do on macOS
    enabled: bool,
    attached: bool,
    invalidated: bool,
    released: bool,
}

impl FakeTap {
    fn receives(&self, kind: EventKind) -> bool {
        self.enabled
            && self.attached
            && !self.invalidated
            && !self.released
            && self.mask.contains(kind)
    }
}

#[derive(Default)]
struct FakeState {
    calls: usize,
    deny_taps: bool,
    deny_query_events: bool,
    cursor: Point,
    taps: Vec<Box<FakeTap>>,
    events: Vec<Box<FakeEvent>>,
    pending: VecDeque<(EventKind, RawEvent)>,
    results: Vec<RawEvent>,
    released_events: usize,
    releases: HashMap<usize, usize>,
}

// The raw pointers only ever point into boxes owned by the state itself.
unsafe impl Send for FakeState {}

impl FakeState {
    fn tap(&mut self, raw: RawTap) -> Option<&mut FakeTap> {
        let raw = raw as *const FakeTap;
        self.taps
            .iter_mut()
            .map(|tap| &mut **tap)
            .find(|tap| &**tap as *const FakeTap == raw)
    }

    fn note_release(&mut self, event: RawEvent) {
        *self.releases.entry(event as usize).or_insert(0) += 1;
    }

    fn store(&mut self, event: FakeEvent) -> RawEvent {
        let mut boxed = Box::new(event);
        let raw = &mut *boxed as *mut FakeEvent as RawEvent;
        self.events.push(boxed);
        raw
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn touch(&self) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls += 1;
        state
    }

    pub fn calls(&self) -> usize {
        self.state().calls
    }

    pub fn deny_taps(&self) {
        self.state().deny_taps = true;
    }

    pub fn deny_query_events(&self) {
        self.state().deny_query_events = true;
    }

    pub fn move_cursor(&self, point: Point) {
        self.state().cursor = point;
    }

    /// A record that stays valid for as long as the backend lives.
    pub fn event(&self, event: FakeEvent) -> RawEvent {
        self.state().store(event)
    }

    /// Queues an event for the next run-loop pump.
    pub fn push(&self, kind: EventKind, event: FakeEvent) {
        let mut state = self.state();
        let raw = state.store(event);
        state.pending.push_back((kind, raw));
    }

    /// What the tap chain returned for each delivered event.
    pub fn results(&self) -> Vec<RawEvent> {
        self.state().results.clone()
    }

    /// Events released through [`Backend::release`].
    pub fn released_events(&self) -> usize {
        self.state().released_events
    }

    /// Releases of one event, by the caller or by the run loop.
    pub fn release_count(&self, event: RawEvent) -> usize {
        let state = self.state();
        state.releases.get(&(event as usize)).copied().unwrap_or(0)
    }

    pub fn tap_mask(&self, raw: RawTap) -> Option<EventMask> {
        self.state().tap(raw).map(|tap| tap.mask)
    }

    pub fn is_enabled(&self, raw: RawTap) -> bool {
        self.state().tap(raw).map_or(false, |tap| tap.enabled)
    }

    pub fn is_released(&self, raw: RawTap) -> bool {
        self.state().tap(raw).map_or(false, |tap| tap.released)
    }

    pub fn live_taps(&self) -> usize {
        self.state().taps.iter().filter(|tap| !tap.released).count()
    }
}

impl Backend for FakeBackend {
    unsafe fn create_tap(
        &self,
        mask: EventMask,
        callback: RawCallback,
        user_info: *mut c_void,
    ) -> RawTap {
        let mut state = self.touch();
        if state.deny_taps {
            return ptr::null_mut();
        }
        let mut tap = Box::new(FakeTap {
            mask,
            callback,
            user_info,
            enabled: true,
            attached: false,
            invalidated: false,
            released: false,
        });
        let raw = &mut *tap as *mut FakeTap as RawTap;
        state.taps.push(tap);
        raw
    }

    unsafe fn enable_tap(&self, tap: RawTap, enabled: bool) {
        if let Some(tap) = self.touch().tap(tap) {
            tap.enabled = enabled;
        }
    }

    unsafe fn invalidate_tap(&self, tap: RawTap) {
        if let Some(tap) = self.touch().tap(tap) {
            tap.invalidated = true;
        }
    }

    unsafe fn add_to_current_run_loop(&self, tap: RawTap) -> bool {
        match self.touch().tap(tap) {
            Some(tap) => {
                tap.attached = true;
                true
            }
            None => false,
        }
    }

    fn run_current_run_loop(&self, _seconds: f64) -> i32 {
        loop {
            let (kind, event, receivers) = {
                let mut state = self.touch();
                let (kind, event) = match state.pending.pop_front() {
                    Some(next) => next,
                    None => return 3,
                };
                let receivers: Vec<(RawCallback, *mut c_void)> = state
                    .taps
                    .iter()
                    .filter(|tap| tap.receives(kind))
                    .map(|tap| (tap.callback, tap.user_info))
                    .collect();
                (kind, event, receivers)
            };
            if receivers.is_empty() {
                continue;
            }
            // the lock is released here: callbacks may call back into the backend
            let mut current = event;
            for (callback, user_info) in receivers {
                if current.is_null() {
                    break;
                }
                current = unsafe { callback(ptr::null_mut(), kind.as_raw(), current, user_info) };
            }
            // the system releases what it delivered, and a replacement
            // along with the original
            let mut state = self.state();
            state.results.push(current);
            state.note_release(event);
            if !current.is_null() && current != event {
                state.note_release(current);
            }
            return 4;
        }
    }

    unsafe fn key_code(&self, event: RawEvent) -> i64 {
        let _state = self.touch();
        (*(event as *const FakeEvent)).key_code
    }

    unsafe fn location(&self, event: RawEvent) -> Point {
        let _state = self.touch();
        (*(event as *const FakeEvent)).location
    }

    fn create_query_event(&self) -> RawEvent {
        let mut state = self.touch();
        if state.deny_query_events {
            return ptr::null_mut();
        }
        let cursor = state.cursor;
        state.store(FakeEvent {
            key_code: 0,
            location: cursor,
        })
    }

    unsafe fn release(&self, object: *mut c_void) {
        let mut state = self.touch();
        let was_tap = state.tap(object).map(|tap| tap.released = true).is_some();
        if !was_tap {
            state.released_events += 1;
            state.note_release(object);
        }
    }
}

/// Keeps every line for inspection.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn levels(&self) -> Vec<Level> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(level, _)| *level)
            .collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn line(&self, level: Level, message: fmt::Arguments<'_>) {
        let mut lines = self.lines.lock().unwrap();
        lines.push((level, message.to_string()));
    }
}

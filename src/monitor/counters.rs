#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the unix epoch, or 0 if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Activity totals shared between the tap callback and readers.
#[derive(Debug, Default)]
pub struct ActivityCounters {
    keyboard: AtomicU64,
    mouse: AtomicU64,
    // unix seconds of the last genuine activity, 0 when unknown
    last_activity: AtomicU64,
}

impl ActivityCounters {
    pub fn keyboard(&self) -> u64 {
        self.keyboard.load(Ordering::SeqCst)
    }

    pub fn mouse(&self) -> u64 {
        self.mouse.load(Ordering::SeqCst)
    }

    pub fn last_activity(&self) -> u64 {
        self.last_activity.load(Ordering::SeqCst)
    }

    pub fn record_keyboard(&self) {
        self.keyboard.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_mouse(&self) {
        self.mouse.fetch_add(1, Ordering::SeqCst);
    }

    pub fn mark_activity(&self, now: u64) {
        self.last_activity.store(now, Ordering::SeqCst);
    }

    pub fn idle_seconds_at(&self, now: u64) -> u64 {
        let last = self.last_activity();
        if last == 0 || now < last {
            return 0;
        }
        now - last
    }

    pub fn reset_at(&self, now: u64) {
        self.keyboard.store(0, Ordering::SeqCst);
        self.mouse.store(0, Ordering::SeqCst);
        self.last_activity.store(now, Ordering::SeqCst);
    }

    pub fn snapshot_at(&self, now: u64) -> ActivitySnapshot {
        ActivitySnapshot {
            timestamp: now,
            keyboard_count: self.keyboard(),
            mouse_count: self.mouse(),
            idle_seconds: self.idle_seconds_at(now),
        }
    }
}

/// One row of the activity log.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub timestamp: u64,
    pub keyboard_count: u64,
    pub mouse_count: u64,
    pub idle_seconds: u64,
}

impl ActivitySnapshot {
    pub const CSV_HEADER: &'static str = "timestamp,keyboard_count,mouse_count,idle_time_seconds";

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.timestamp, self.keyboard_count, self.mouse_count, self.idle_seconds
        )
    }
}

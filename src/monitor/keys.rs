use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Remembers which keys are down so auto-repeat is not counted as
/// fresh activity.
#[derive(Debug)]
pub struct KeyTracker {
    held: HashMap<u16, Instant>,
    timeout: Duration,
}

impl KeyTracker {
    pub fn new(timeout: Duration) -> KeyTracker {
        KeyTracker {
            held: HashMap::new(),
            timeout,
        }
    }

    /// Returns true when this key-down is new activity: the key was not
    /// held, or has been held longer than the timeout.
    pub fn press(&mut self, code: u16, now: Instant) -> bool {
        match self.held.get(&code) {
            Some(&since) if now.saturating_duration_since(since) <= self.timeout => false,
            _ => {
                self.held.insert(code, now);
                true
            }
        }
    }

    pub fn release(&mut self, code: u16) {
        self.held.remove(&code);
    }

    /// Forgets keys held longer than the timeout (stuck keys, lost key-ups).
    pub fn sweep(&mut self, now: Instant) {
        let timeout = self.timeout;
        let stale = |since: Instant| now.saturating_duration_since(since) >= timeout;
        self.held.retain(|_, since| !stale(*since));
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

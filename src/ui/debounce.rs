use std::time::{Duration, Instant};

/// Last-call-wins coalescing for search input.
///
/// Every keystroke calls `touch`, which restarts the quiet window. The event
/// loop calls `fire` on each tick; it returns true once, after the input has
/// been quiet for the whole window. The caller then runs the search with
/// whatever the input holds at that moment.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    dirty_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            dirty_since: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.dirty_since {
            Some(since) if now.saturating_duration_since(since) >= self.window => {
                self.dirty_since = None;
                true
            }
            _ => false,
        }
    }

    /// Skip the wait (Enter pressed). True if something was pending.
    pub fn flush(&mut self) -> bool {
        self.dirty_since.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.dirty_since = None;
    }
}

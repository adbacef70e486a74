//! Anti-starvation timer.
//!
//! Each bus direction owns one timer. The timer reloads while its direction
//! does not hold the bus and counts down while it does; `max_time` rises on
//! the `limit`-th consecutive tick, allowing the FSM to hand the bus over even
//! though work is still pending.

/// Per-direction dwell limiter.
#[derive(Clone, Debug)]
pub struct AntiStarvation {
    limit: u32,
    remaining: u32,
}

impl AntiStarvation {
    /// Creates a timer allowing `limit` ticks per window.
    ///
    /// A limit of zero disables the timer: `max_time` never asserts.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            remaining: limit.saturating_sub(1),
        }
    }

    /// Returns `true` once the window has been held for `limit` ticks.
    #[inline]
    pub fn max_time(&self) -> bool {
        self.limit != 0 && self.remaining == 0
    }

    /// Registers one tick.
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether the direction held the bus during this tick
    pub fn tick(&mut self, enabled: bool) {
        if self.limit == 0 {
            return;
        }
        if !enabled {
            self.remaining = self.limit - 1;
        } else if !self.max_time() {
            self.remaining -= 1;
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.limit.saturating_sub(1);
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

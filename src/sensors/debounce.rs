//! Time-based debouncer for a single digital line.
//!
//! The stable value only follows the raw reading once the raw reading has
//! held the same level for at least the debounce interval, measured on the
//! monotonic millisecond clock.  A line that chatters faster than the
//! interval never moves the stable value.
//!
//! ```text
//! raw     ‾‾‾|_|‾|__________________
//! stable  ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|__________
//!                  ◀─ 50 ms ─▶
//! ```

/// One tracked boolean input.
#[derive(Debug, Clone, Copy)]
pub struct DigitalSignal {
    interval_ms: u64,
    last_raw: bool,
    last_change_ms: u64,
    stable: bool,
}

impl DigitalSignal {
    /// A signal whose stable (and last raw) value starts at `initial`.
    pub fn new(initial: bool, interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_raw: initial,
            last_change_ms: 0,
            stable: initial,
        }
    }

    /// Feed one raw reading and return the stable value.
    pub fn update(&mut self, raw: bool, now_ms: u64) -> bool {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change_ms = now_ms;
        } else if raw != self.stable
            && now_ms.saturating_sub(self.last_change_ms) >= self.interval_ms
        {
            self.stable = raw;
        }
        self.stable
    }

    /// The debounced value.
    pub fn stable(&self) -> bool {
        self.stable
    }

    /// The most recent raw reading.
    pub fn raw(&self) -> bool {
        self.last_raw
    }

    /// Timestamp of the last raw edge.
    pub fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }
}

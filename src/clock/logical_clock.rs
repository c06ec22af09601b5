use std::cmp;
use std::fmt;

/// LogicalClock is a scalar Lamport clock owned by a single server.
///
/// Every outbound message is stamped with `tick()`, and every inbound message that carries a
/// clock value is merged exactly once with `observe()`. The value never decreases, and pins at
/// `u64::MAX` instead of wrapping.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct LogicalClock {
    value: u64,
}

impl LogicalClock {
    pub fn new() -> Self {
        LogicalClock { value: 0 }
    }

    /// `tick()` advances the clock for a local event (sending a message) and returns the value
    /// to stamp on it.
    pub fn tick(&mut self) -> u64 {
        self.value = self.value.saturating_add(1);
        self.value
    }

    /// `observe()` applies the Lamport receive rule: `local = max(local, received) + 1`.
    pub fn observe(&mut self, received: u64) -> u64 {
        self.value = cmp::max(self.value, received).saturating_add(1);
        self.value
    }

    pub fn current(&self) -> u64 {
        self.value
    }
}

impl fmt::Debug for LogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Wall-clock source for the frame loop, in milliseconds.
///
/// The live session reads this once per tick and never blocks on it.
pub trait TickSource: Send {
    fn now_ms(&self) -> f64;
}

/// Monotonic clock anchored at construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Synthetic clock for deterministic runs.
///
/// Clones share one time value, so a test can keep a handle while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    pub fn set(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, dt_ms: f64) {
        self.set(self.now_ms() + dt_ms);
    }
}

impl TickSource for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/clock.rs"]
mod tests;

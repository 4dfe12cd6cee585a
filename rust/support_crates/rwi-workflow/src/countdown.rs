//! One-shot countdown latch.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A latch initialized with a number of expected arrivals.
///
/// Each participant calls [`arrive`](Countdown::arrive) exactly once. The call that
/// brings the count to zero returns `true`; every other call returns `false`. This
/// lets a group of workers elect the single one that performs a completion action
/// (for example, publishing an end-of-stream marker) without any further locking.
#[derive(Debug)]
pub struct Countdown {
    remaining: AtomicUsize,
}

impl Countdown {
    pub fn new(count: usize) -> Countdown {
        Countdown {
            remaining: AtomicUsize::new(count),
        }
    }

    /// Records one arrival. Returns `true` for the arrival that closed the latch.
    ///
    /// Arrivals past zero are ignored and return `false`, so an over-eager
    /// participant can never trigger the completion action twice.
    pub fn arrive(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map(|prev| prev == 1)
            .unwrap_or(false)
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.remaining() == 0
    }
}

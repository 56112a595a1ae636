use std::hint;
use std::thread;

/// Pacing for the scheduler's polling loops.
///
/// Every wait on the data plane is a poll: a submitter against a full
/// pending ring, the dispatcher against a full scheduled ring, a worker
/// against an empty one. None of them may block, but all of them must
/// eventually notice an exit condition (the shutdown latch, typically).
/// [`pause`](Backoff::pause) climbs an escalation ladder: PAUSE-hint
/// bursts that double in length, then OS yields. It reports `true` once
/// the ladder is exhausted; that boundary is where the caller re-checks
/// its exit condition and [`reset`](Backoff::reset)s, keeping the check
/// off the hot path.
#[derive(Debug, Default)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    /// Busy-wait steps before the ladder starts yielding; the burst length
    /// doubles each step, up to `1 << (SPIN_STEPS - 1)` PAUSE hints.
    const SPIN_STEPS: u32 = 5;
    /// Yield steps before the ladder reports exhaustion.
    const YIELD_STEPS: u32 = 4;

    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Wait a little longer than last time.
    ///
    /// Returns `true` when the ladder is exhausted (and keeps yielding and
    /// returning `true` until [`reset`](Backoff::reset)); the caller should
    /// re-check its exit condition there.
    #[inline]
    pub fn pause(&mut self) -> bool {
        if self.step < Self::SPIN_STEPS {
            for _ in 0..(1u32 << self.step) {
                hint::spin_loop();
            }
            self.step += 1;
            false
        } else {
            thread::yield_now();
            if self.step < Self::SPIN_STEPS + Self::YIELD_STEPS {
                self.step += 1;
            }
            self.step >= Self::SPIN_STEPS + Self::YIELD_STEPS
        }
    }

    /// Start a fresh ladder, after progress or an exit-condition check.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

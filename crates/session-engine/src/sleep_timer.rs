//! Sleep timer counting down playing time only

const TICK_MS: u64 = 1000;

/// Countdown that pauses playback when it runs out
///
/// The timer ticks once per second while both a countdown is set and the
/// main transport is playing. Pausing freezes it.
#[derive(Debug, Clone, Default)]
pub struct SleepTimer {
    remaining: u64,
    next_tick: Option<u64>,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh countdown of `minutes`; 0 turns the timer off
    pub fn set_minutes(&mut self, minutes: u32, now: u64, playing: bool) {
        self.remaining = u64::from(minutes) * 60;
        self.next_tick = None;
        if playing {
            self.resume(now);
        }
    }

    /// Resumes ticking when playback starts
    pub fn resume(&mut self, now: u64) {
        if self.remaining > 0 && self.next_tick.is_none() {
            self.next_tick = Some(now + TICK_MS);
        }
    }

    /// Freezes the countdown
    pub fn freeze(&mut self) {
        self.next_tick = None;
    }

    /// Processes due ticks; returns true when the countdown just expired
    pub fn poll(&mut self, now: u64) -> bool {
        while let Some(tick) = self.next_tick {
            if tick > now {
                break;
            }
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.next_tick = None;
                return true;
            }
            self.next_tick = Some(tick + TICK_MS);
        }
        false
    }

    /// Seconds left on the countdown
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_set(&self) -> bool {
        self.remaining > 0
    }

    pub fn is_ticking(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.next_tick
    }
}

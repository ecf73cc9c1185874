//! Listening time accumulator

const TICK_MS: u64 = 1000;

/// Counts whole seconds of playback and releases them in batches
///
/// Seconds are handed out every `flush_every` seconds, and in full whenever
/// playback stops, so the caller can add them to the day's bucket.
#[derive(Debug, Clone)]
pub struct ListeningAccumulator {
    flush_every: u64,
    pending: u64,
    next_tick: Option<u64>,
}

impl ListeningAccumulator {
    pub fn new(flush_every: u64) -> Self {
        Self {
            flush_every: flush_every.max(1),
            pending: 0,
            next_tick: None,
        }
    }

    pub fn start(&mut self, now: u64) {
        if self.next_tick.is_none() {
            self.next_tick = Some(now + TICK_MS);
        }
    }

    /// Stops counting and returns everything not yet flushed
    pub fn stop(&mut self) -> u64 {
        self.next_tick = None;
        self.take()
    }

    /// Returns and clears the unflushed seconds
    pub fn take(&mut self) -> u64 {
        std::mem::take(&mut self.pending)
    }

    /// Counts due ticks; returns the seconds flushed by them
    pub fn poll(&mut self, now: u64) -> u64 {
        let mut flushed = 0;
        while let Some(tick) = self.next_tick {
            if tick > now {
                break;
            }
            self.pending += 1;
            if self.pending >= self.flush_every {
                flushed += self.take();
            }
            self.next_tick = Some(tick + TICK_MS);
        }
        flushed
    }

    /// Seconds counted but not yet flushed
    pub fn pending(&self) -> u64 {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.next_tick
    }
}

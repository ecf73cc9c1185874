//! Time sources for the engine's timers
//!
//! Every timer in the engine is a deadline in milliseconds on a [`Clock`].
//! The engine never sleeps; a host (the async driver or a test) asks for
//! the next deadline and calls back once the clock has reached it.

use chrono::{Local, NaiveDate};
use smartbook_core::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since an arbitrary origin
    fn now_ms(&self) -> u64;

    /// Wall clock milliseconds since the Unix epoch, used to mint entry ids
    fn wall_ms(&self) -> u64;

    /// Current local calendar day, for listening statistics and clip dates
    fn today(&self) -> NaiveDate;
}

/// Clock backed by [`std::time::Instant`] and the system calendar
#[derive(Debug, Clone)]
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

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        duration_ms(self.origin.elapsed())
    }

    fn wall_ms(&self) -> u64 {
        Timestamp::now().as_millis().max(0) as u64
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock backed by tokio's time, so paused-time tests drive it too
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }

    /// Converts an engine deadline back into a tokio instant
    pub fn instant_at(&self, deadline_ms: u64) -> tokio::time::Instant {
        self.origin + Duration::from_millis(deadline_ms)
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        duration_ms(self.origin.elapsed())
    }

    fn wall_ms(&self) -> u64 {
        Timestamp::now().as_millis().max(0) as u64
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Hand-driven clock for tests and simulations
///
/// Clones share the same time, so a test can keep one copy and hand the
/// other to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    epoch_ms: u64,
    today: Arc<Mutex<NaiveDate>>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(0)),
            epoch_ms: 1_700_000_000_000,
            today: Arc::new(Mutex::new(today)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn set_today(&self, day: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = day;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn wall_ms(&self) -> u64 {
        self.epoch_ms + self.now_ms()
    }

    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
    }

    #[test]
    fn test_manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(day(1));
        let engine_copy = clock.clone();

        clock.advance(1500);
        assert_eq!(engine_copy.now_ms(), 1500);

        clock.set_today(day(2));
        assert_eq!(engine_copy.today(), day(2));
    }

    #[test]
    fn test_manual_wall_clock_moves_with_time() {
        let clock = ManualClock::new(day(1));
        let before = clock.wall_ms();
        clock.advance(10);
        assert_eq!(clock.wall_ms(), before + 10);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        assert!(clock.now_ms() >= first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        tokio::time::advance(Duration::from_millis(2500)).await;
        assert_eq!(clock.now_ms(), 2500);
        assert_eq!(clock.instant_at(2500), tokio::time::Instant::now());
    }
}

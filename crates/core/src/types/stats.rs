//! Listening statistics

use crate::types::BookKey;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-book figures recorded the first time the book's length is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookStats {
    /// Total length in seconds
    pub duration: f64,
}

/// Accumulated listening time
///
/// Totals only ever grow; there is no operation that lowers a day's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListeningStats {
    /// Seconds listened, keyed by calendar day (ISO `YYYY-MM-DD`)
    pub listening_activity: BTreeMap<NaiveDate, u64>,
    pub books: BTreeMap<BookKey, BookStats>,
}

impl ListeningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds seconds to a day's bucket
    pub fn add_listening(&mut self, day: NaiveDate, seconds: u64) {
        if seconds == 0 {
            return;
        }
        *self.listening_activity.entry(day).or_insert(0) += seconds;
    }

    /// Seconds listened on `day`
    pub fn seconds_on(&self, day: NaiveDate) -> u64 {
        self.listening_activity.get(&day).copied().unwrap_or(0)
    }

    /// Seconds listened across all days
    pub fn total_seconds(&self) -> u64 {
        self.listening_activity.values().sum()
    }

    /// Records a book's duration if none is known yet
    ///
    /// Returns true when the duration was stored.
    pub fn record_book_duration(&mut self, key: &BookKey, duration: f64) -> bool {
        if !duration.is_finite() || duration <= 0.0 || self.books.contains_key(key) {
            return false;
        }
        self.books.insert(key.clone(), BookStats { duration });
        true
    }

    /// Returns `(day, seconds)` for the `days` days ending at `today`, oldest first
    ///
    /// Days without activity are included with zero seconds.
    pub fn recent_days(&self, today: NaiveDate, days: u32) -> Vec<(NaiveDate, u64)> {
        (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
            .map(|day| (day, self.seconds_on(day)))
            .collect()
    }

    /// Number of days with any recorded listening
    pub fn active_days(&self) -> usize {
        self.listening_activity.values().filter(|s| **s > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_add_listening_accumulates() {
        let mut stats = ListeningStats::new();
        stats.add_listening(day(1), 15);
        stats.add_listening(day(1), 15);
        stats.add_listening(day(2), 30);
        assert_eq!(stats.seconds_on(day(1)), 30);
        assert_eq!(stats.seconds_on(day(2)), 30);
        assert_eq!(stats.seconds_on(day(3)), 0);
        assert_eq!(stats.total_seconds(), 60);
        assert_eq!(stats.active_days(), 2);
    }

    #[test]
    fn test_zero_seconds_does_not_create_bucket() {
        let mut stats = ListeningStats::new();
        stats.add_listening(day(1), 0);
        assert!(stats.listening_activity.is_empty());
    }

    #[test]
    fn test_record_book_duration_only_once() {
        let mut stats = ListeningStats::new();
        let key = BookKey::new("a.m4b");
        assert!(!stats.record_book_duration(&key, f64::NAN));
        assert!(stats.record_book_duration(&key, 3600.0));
        assert!(!stats.record_book_duration(&key, 1200.0));
        assert_eq!(stats.books[&key].duration, 3600.0);
    }

    #[test]
    fn test_recent_days_fills_gaps() {
        let mut stats = ListeningStats::new();
        stats.add_listening(day(5), 60);
        stats.add_listening(day(7), 120);
        let recent = stats.recent_days(day(7), 3);
        assert_eq!(recent, vec![(day(5), 60), (day(6), 0), (day(7), 120)]);
    }

    #[test]
    fn test_serializes_iso_dates() {
        let mut stats = ListeningStats::new();
        stats.add_listening(day(9), 45);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"2024-03-09\":45"));
        let back: ListeningStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}

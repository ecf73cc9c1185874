//! Debounced session saves

/// Dirty flag with a trailing deadline
///
/// Each change pushes the deadline to `now + debounce`, so a burst of
/// changes results in a single save once things settle.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    debounce_ms: u64,
    deadline: Option<u64>,
}

impl SaveScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            deadline: None,
        }
    }

    pub fn mark_dirty(&mut self, now: u64) {
        self.deadline = Some(now.saturating_add(self.debounce_ms));
    }

    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true, and clears the flag, once the deadline has passed
    pub fn poll(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clears the flag for an immediate save
    pub fn take(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_saves_once_after_last_change() {
        let mut saves = SaveScheduler::new(2000);
        saves.mark_dirty(0);
        saves.mark_dirty(500);
        saves.mark_dirty(1000);

        assert!(!saves.poll(2999));
        assert!(saves.poll(3000));
        assert!(!saves.poll(10_000));
    }

    #[test]
    fn test_take_clears_deadline() {
        let mut saves = SaveScheduler::new(2000);
        assert!(!saves.take());
        saves.mark_dirty(0);
        assert!(saves.take());
        assert_eq!(saves.next_deadline(), None);
    }
}

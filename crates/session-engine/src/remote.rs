//! Short/long press disambiguation for headset buttons
//!
//! Hold-to-repeat hardware emits a stream of raw presses while a button is
//! held. A single press followed by silence is a tap; a second press inside
//! the threshold means the button is being held.
//!
//! ```text
//! Idle --press--> Pending --deadline--> Idle        (short fires)
//!                    |
//!                  press (before deadline)          (long fires)
//!                    v
//!                LongFired --press--> LongFired     (deadline extended)
//!                    |
//!                 deadline
//!                    v
//!                  Idle
//! ```

use smartbook_core::{PressKind, RemoteButton};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Idle,
    Pending { deadline: u64 },
    LongFired { deadline: u64 },
}

/// State machine for one physical button
#[derive(Debug, Clone)]
pub struct PressDetector {
    threshold_ms: u64,
    state: PressState,
}

impl PressDetector {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            state: PressState::Idle,
        }
    }

    /// Feeds a raw press at `now`
    ///
    /// [`poll`](Self::poll) must have been called for `now` first so that an
    /// expired gesture has already been settled.
    pub fn press(&mut self, now: u64) -> Option<PressKind> {
        let deadline = now.saturating_add(self.threshold_ms);
        match self.state {
            PressState::Pending { deadline: pending } if now < pending => {
                self.state = PressState::LongFired { deadline };
                Some(PressKind::Long)
            }
            PressState::LongFired { deadline: held } if now < held => {
                self.state = PressState::LongFired { deadline };
                None
            }
            _ => {
                self.state = PressState::Pending { deadline };
                None
            }
        }
    }

    /// Settles the gesture once its deadline has passed
    pub fn poll(&mut self, now: u64) -> Option<PressKind> {
        match self.state {
            PressState::Pending { deadline } if now >= deadline => {
                self.state = PressState::Idle;
                Some(PressKind::Short)
            }
            PressState::LongFired { deadline } if now >= deadline => {
                self.state = PressState::Idle;
                None
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        match self.state {
            PressState::Idle => None,
            PressState::Pending { deadline } | PressState::LongFired { deadline } => Some(deadline),
        }
    }

    /// Drops any gesture in progress without firing
    pub fn cancel(&mut self) {
        self.state = PressState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        self.state == PressState::Idle
    }
}

/// Press detectors for both headset buttons
#[derive(Debug, Clone)]
pub struct RemoteDispatcher {
    previous: PressDetector,
    next: PressDetector,
}

impl RemoteDispatcher {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            previous: PressDetector::new(threshold_ms),
            next: PressDetector::new(threshold_ms),
        }
    }

    pub fn press(&mut self, button: RemoteButton, now: u64) -> Option<PressKind> {
        self.detector(button).press(now)
    }

    /// Returns every gesture settled by `now`
    pub fn poll(&mut self, now: u64) -> Vec<(RemoteButton, PressKind)> {
        [RemoteButton::Previous, RemoteButton::Next]
            .into_iter()
            .filter_map(|button| self.detector(button).poll(now).map(|kind| (button, kind)))
            .collect()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        match (self.previous.next_deadline(), self.next.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn cancel(&mut self) {
        self.previous.cancel();
        self.next.cancel();
    }

    fn detector(&mut self, button: RemoteButton) -> &mut PressDetector {
        match button {
            RemoteButton::Previous => &mut self.previous,
            RemoteButton::Next => &mut self.next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays raw presses and polls every millisecond up to `until`
    fn simulate(presses: &[u64], until: u64) -> Vec<PressKind> {
        let mut detector = PressDetector::new(400);
        let mut fired = Vec::new();
        for now in 0..=until {
            fired.extend(detector.poll(now));
            if presses.contains(&now) {
                fired.extend(detector.press(now));
            }
        }
        fired
    }

    #[test]
    fn test_single_press_is_short() {
        assert_eq!(simulate(&[0], 1000), vec![PressKind::Short]);
    }

    #[test]
    fn test_short_fires_exactly_at_threshold() {
        let mut detector = PressDetector::new(400);
        assert_eq!(detector.press(0), None);
        assert_eq!(detector.poll(399), None);
        assert_eq!(detector.poll(400), Some(PressKind::Short));
        assert!(detector.is_idle());
    }

    #[test]
    fn test_two_presses_fire_one_long() {
        assert_eq!(simulate(&[0, 100], 2000), vec![PressKind::Long]);
    }

    #[test]
    fn test_held_button_fires_long_once() {
        let presses: Vec<u64> = (0..10).map(|i| i * 150).collect();
        assert_eq!(simulate(&presses, 5000), vec![PressKind::Long]);
    }

    #[test]
    fn test_separate_taps_are_separate_shorts() {
        assert_eq!(
            simulate(&[0, 1000], 3000),
            vec![PressKind::Short, PressKind::Short]
        );
    }

    #[test]
    fn test_new_gesture_after_long_release() {
        assert_eq!(
            simulate(&[0, 100, 1000], 3000),
            vec![PressKind::Long, PressKind::Short]
        );
    }

    #[test]
    fn test_buttons_are_independent() {
        let mut remote = RemoteDispatcher::new(400);
        remote.press(RemoteButton::Previous, 0);
        assert_eq!(remote.press(RemoteButton::Next, 100), None);
        assert_eq!(remote.next_deadline(), Some(400));

        assert_eq!(
            remote.poll(500),
            vec![
                (RemoteButton::Previous, PressKind::Short),
                (RemoteButton::Next, PressKind::Short)
            ]
        );
        assert_eq!(remote.next_deadline(), None);
    }

    #[test]
    fn test_cancel_drops_pending_gesture() {
        let mut remote = RemoteDispatcher::new(400);
        remote.press(RemoteButton::Next, 0);
        remote.cancel();
        assert!(remote.poll(1000).is_empty());
    }
}

//! Clip windows and the clip transport

use crate::error::{EngineError, EngineResult};
use smartbook_core::{Clip, EntryId};

/// `[start, end)` span of the parent audiobook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

impl ClipWindow {
    /// Window of at most `length` seconds ending at `position`
    pub fn trailing(position: f64, length: f64, min_position: f64) -> EngineResult<Self> {
        if !position.is_finite() {
            return Err(EngineError::invalid("clip position", position));
        }
        if position < min_position {
            return Err(EngineError::InsufficientPlayback {
                position,
                required: min_position,
            });
        }

        Ok(Self {
            start: (position - length).max(0.0),
            end: position,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Clip transport: a second "now playing" that lives on the clip device
///
/// Times reported by the device are absolute in the parent audiobook and
/// are folded into the clip's own timeline here.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlayback {
    clip_id: EntryId,
    start: f64,
    end: f64,
    duration: f64,
    relative_time: f64,
    is_playing: bool,
    saved_position: f64,
    pending_seek: Option<f64>,
}

impl ClipPlayback {
    /// Starts clip mode for `clip`, remembering where the main transport was
    pub fn new(clip: &Clip, saved_position: f64) -> Self {
        Self {
            clip_id: clip.id,
            start: clip.start_time,
            end: clip.end_time,
            duration: clip.duration,
            relative_time: 0.0,
            is_playing: false,
            saved_position,
            pending_seek: None,
        }
    }

    pub fn clip_id(&self) -> EntryId {
        self.clip_id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Position inside the clip, in `[0, duration]`
    pub fn relative_time(&self) -> f64 {
        self.relative_time
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Main transport position to restore when clip mode closes
    pub fn saved_position(&self) -> f64 {
        self.saved_position
    }

    pub fn is_finished(&self) -> bool {
        self.relative_time >= self.duration
    }

    /// Folds an absolute device time into the clip timeline
    ///
    /// Returns true when the clip has reached its end.
    pub(crate) fn apply_device_time(&mut self, device_time: f64) -> bool {
        self.relative_time = (device_time - self.start).clamp(0.0, self.duration);
        if self.is_finished() {
            self.relative_time = self.duration;
            self.is_playing = false;
            return true;
        }
        false
    }

    /// Absolute device time for a fraction of the clip timeline
    pub(crate) fn seek_fraction(&mut self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        self.relative_time = fraction * self.duration;
        self.start + self.relative_time
    }

    /// Absolute device time to resume from; a finished clip restarts
    pub(crate) fn resume_point(&mut self) -> f64 {
        if self.is_finished() {
            self.relative_time = 0.0;
        }
        self.start + self.relative_time
    }

    pub(crate) fn pending_seek(&self) -> Option<f64> {
        self.pending_seek
    }

    pub(crate) fn set_pending_seek(&mut self, time: Option<f64>) {
        self.pending_seek = time;
    }

    pub(crate) fn take_pending_seek(&mut self) -> Option<f64> {
        self.pending_seek.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn clip(start: f64, end: f64) -> Clip {
        Clip::new(EntryId::from_raw(1), start, end, 0, "2024-01-01")
    }

    #[test]
    fn test_trailing_window_caps_length() {
        let window = ClipWindow::trailing(125.0, 60.0, 1.0).expect("window");
        assert_eq!(window, ClipWindow { start: 65.0, end: 125.0 });
        assert_eq!(window.duration(), 60.0);
    }

    #[test]
    fn test_trailing_window_near_start() {
        let window = ClipWindow::trailing(12.5, 60.0, 1.0).expect("window");
        assert_eq!(window.start, 0.0);
        assert_eq!(window.duration(), 12.5);
    }

    #[test]
    fn test_trailing_window_requires_playback() {
        let err = ClipWindow::trailing(0.4, 60.0, 1.0).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientPlayback { .. }));
        assert!(ClipWindow::trailing(f64::NAN, 60.0, 1.0).is_err());
    }

    #[test]
    fn test_device_time_is_clamped_into_clip() {
        let mut playback = ClipPlayback::new(&clip(100.0, 160.0), 0.0);
        playback.set_playing(true);

        assert!(!playback.apply_device_time(95.0));
        assert_eq!(playback.relative_time(), 0.0);

        assert!(!playback.apply_device_time(130.0));
        assert_eq!(playback.relative_time(), 30.0);

        assert!(playback.apply_device_time(161.0));
        assert_eq!(playback.relative_time(), 60.0);
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_seek_fraction() {
        let mut playback = ClipPlayback::new(&clip(100.0, 160.0), 0.0);
        assert_relative_eq!(playback.seek_fraction(0.25), 115.0);
        assert_relative_eq!(playback.relative_time(), 15.0);
        assert_relative_eq!(playback.seek_fraction(3.0), 160.0);
    }

    #[test]
    fn test_finished_clip_resumes_from_start() {
        let mut playback = ClipPlayback::new(&clip(10.0, 20.0), 0.0);
        playback.apply_device_time(25.0);
        assert_eq!(playback.resume_point(), 10.0);
        assert_eq!(playback.relative_time(), 0.0);
    }
}

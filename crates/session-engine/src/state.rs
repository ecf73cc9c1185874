//! Engine state management

use crate::clip::ClipPlayback;

/// Main transport of the loaded audiobook
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    is_playing: bool,
    position: f64,
    duration: f64,
    pending_seek: Option<f64>,
    at_end: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            is_playing: false,
            position: 0.0,
            duration: 0.0,
            pending_seek: None,
            at_end: false,
        }
    }

    /// State for a freshly loaded source restored to `position`
    pub fn restored(position: f64) -> Self {
        Self {
            position,
            pending_seek: (position > 0.0).then_some(position),
            ..Self::new()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
        if playing {
            self.at_end = false;
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    /// Known duration in seconds, 0 while unknown
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn has_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Seek waiting for the device to become ready
    pub fn pending_seek(&self) -> Option<f64> {
        self.pending_seek
    }

    pub fn set_pending_seek(&mut self, time: Option<f64>) {
        self.pending_seek = time;
    }

    pub fn take_pending_seek(&mut self) -> Option<f64> {
        self.pending_seek.take()
    }

    /// True once the device reported the end of the book and nothing moved since
    pub fn at_end(&self) -> bool {
        self.at_end
    }

    pub fn set_at_end(&mut self, at_end: bool) {
        self.at_end = at_end;
    }

    /// Clamps `time` to `[0, duration]`, leaving the top open while the duration is unknown
    pub fn clamp(&self, time: f64) -> f64 {
        let time = time.max(0.0);
        if self.has_duration() {
            time.min(self.duration)
        } else {
            time
        }
    }

    pub fn progress_percentage(&self) -> f64 {
        if !self.has_duration() {
            return 0.0;
        }
        (self.position / self.duration * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Which transport currently owns audible output
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TransportMode {
    #[default]
    Main,
    Clip(ClipPlayback),
}

impl TransportMode {
    pub fn clip(&self) -> Option<&ClipPlayback> {
        match self {
            TransportMode::Main => None,
            TransportMode::Clip(playback) => Some(playback),
        }
    }

    pub fn clip_mut(&mut self) -> Option<&mut ClipPlayback> {
        match self {
            TransportMode::Main => None,
            TransportMode::Clip(playback) => Some(playback),
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, TransportMode::Clip(_))
    }
}

// crates/session-engine/src/output.rs
// Audio output seam driven by the session engine

use crate::error::EngineResult;
use smartbook_core::AudioHandle;

/// A playback device the engine steers
///
/// The device does the actual decoding and mixing. It reports what happens
/// through [`AudioEvent`]s that the host forwards to the engine. Commands
/// are fire-and-forget: the engine updates its own state optimistically and
/// reconciles when the matching event arrives.
pub trait AudioOutput: Send {
    /// Points the device at a new source. The device starts paused.
    fn load(&mut self, audio: &AudioHandle) -> EngineResult<()>;

    /// Detaches the current source
    fn unload(&mut self);

    fn play(&mut self) -> EngineResult<()>;

    fn pause(&mut self);

    /// Seeks to an absolute time in seconds
    fn seek(&mut self, time: f64);

    fn set_rate(&mut self, rate: f64);

    /// Sets the output volume (0-1)
    fn set_volume(&mut self, volume: f64);

    fn current_time(&self) -> f64;

    /// Source duration, once the device knows it
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    /// Whether the loaded source accepts seeks yet
    fn is_ready(&self) -> bool;
}

/// Notifications emitted by an [`AudioOutput`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// Source metadata is available, including its duration in seconds
    LoadedMetadata { duration: f64 },
    /// The source can now be played and seeked
    CanPlay,
    /// Periodic position report, in seconds
    TimeUpdate { time: f64 },
    Play,
    Pause,
    /// Playback reached the end of the source
    Ended,
}

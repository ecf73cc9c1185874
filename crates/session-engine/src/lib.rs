//! Playback session engine for SmartBook
//!
//! Drives one listening session: the main and clip transports over two
//! [`AudioOutput`] devices, bookmarks and clips, the headset remote, the
//! sleep timer, listening statistics and debounced session saves. Clips can
//! be exported to WAV files with [`ClipExporter`].

mod clip;
mod clock;
mod decoder;
mod driver;
mod engine;
mod error;
mod export;
mod listening;
mod output;
mod persistence;
mod remote;
mod sleep_timer;
mod state;

pub use clip::{ClipPlayback, ClipWindow};
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use decoder::{AudioDecoder, DecodedAudio};
pub use driver::{SessionCommand, SessionDriver, SessionHandle};
pub use engine::{EngineEvent, SessionEngine, SessionStatus};
pub use error::{EngineError, EngineResult};
pub use export::{downmix, ChannelLayout, ClipExporter, ExportSummary, PcmSource};
pub use listening::ListeningAccumulator;
pub use output::{AudioEvent, AudioOutput};
pub use persistence::SaveScheduler;
pub use remote::{PressDetector, RemoteDispatcher};
pub use sleep_timer::SleepTimer;
pub use state::{PlaybackState, TransportMode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _ = TransportMode::Main;
        let _ = SleepTimer::new();
        let _ = ChannelLayout::default();
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::invalid("seek time", f64::INFINITY);
        assert!(error.to_string().contains("seek time"));
    }
}

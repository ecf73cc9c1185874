//! Clip export to standalone WAV files
//!
//! A clip is cut out of the parent audiobook's decoded samples and written
//! as 16-bit PCM. Exports run on a blocking thread; the exporter tracks which
//! clips are in flight so a second request for the same clip is refused.

use crate::decoder::AudioDecoder;
use crate::error::{EngineError, EngineResult};
use smartbook_core::{format_time, Clip, EntryId};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Decoded audio that can be read by time range
pub trait PcmSource {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;

    /// Total length in seconds, if the container reports it
    fn duration_secs(&self) -> Option<f64>;

    /// Interleaved samples for `[start, start + duration)`
    ///
    /// May return fewer frames than requested when the source ends early.
    fn read_segment(&mut self, start: f64, duration: f64) -> EngineResult<Vec<f32>>;
}

/// Channel layout of the exported file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
    /// Keep the source channels
    #[default]
    Preserve,
    /// Average all channels into one
    Mono,
}

/// What an export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub clip_id: EntryId,
    pub path: PathBuf,
    pub start: f64,
    /// Seconds actually written
    pub duration: f64,
    /// True when the source ended before the clip did
    pub truncated: bool,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: usize,
}

/// Runs clip exports and remembers which clips are being exported
#[derive(Debug, Clone, Default)]
pub struct ClipExporter {
    in_progress: Arc<Mutex<HashSet<EntryId>>>,
}

impl ClipExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exporting(&self, id: EntryId) -> bool {
        self.lock().contains(&id)
    }

    /// Exports `clip` from an already opened source
    pub fn export<S: PcmSource + ?Sized>(
        &self,
        source: &mut S,
        clip: &Clip,
        dest: &Path,
        layout: ChannelLayout,
    ) -> EngineResult<ExportSummary> {
        let _guard = self.begin(clip.id)?;
        export_segment(source, clip, dest, layout)
    }

    /// Decodes `audio_path` and exports `clip` on a blocking thread
    ///
    /// Dropping the returned future does not stop the export; the clip stays
    /// busy until the work finishes.
    pub async fn export_file(
        &self,
        audio_path: PathBuf,
        clip: Clip,
        dest: PathBuf,
        layout: ChannelLayout,
    ) -> EngineResult<ExportSummary> {
        let guard = self.begin(clip.id)?;
        log::info!("Exporting {} to {}", clip.title, dest.display());

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let mut decoder = AudioDecoder::open(&audio_path)?;
            export_segment(&mut decoder, &clip, &dest, layout)
        })
        .await
        .map_err(|e| EngineError::Export(format!("Export task failed: {}", e)))?
    }

    fn begin(&self, id: EntryId) -> EngineResult<ExportGuard> {
        if !self.lock().insert(id) {
            return Err(EngineError::ExportInProgress(id));
        }
        Ok(ExportGuard {
            in_progress: Arc::clone(&self.in_progress),
            id,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<EntryId>> {
        self.in_progress.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the clip id when the export ends, however it ends
struct ExportGuard {
    in_progress: Arc<Mutex<HashSet<EntryId>>>,
    id: EntryId,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.in_progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

fn export_segment<S: PcmSource + ?Sized>(
    source: &mut S,
    clip: &Clip,
    dest: &Path,
    layout: ChannelLayout,
) -> EngineResult<ExportSummary> {
    let start = clip.start_time;
    if !start.is_finite() || start < 0.0 {
        return Err(EngineError::invalid("clip start", start));
    }
    if !clip.duration.is_finite() || clip.duration <= 0.0 {
        return Err(EngineError::invalid("clip duration", clip.duration));
    }

    let mut duration = clip.duration;
    let mut truncated = false;
    if let Some(total) = source.duration_secs() {
        if start + duration > total {
            duration = (total - start).max(0.0);
            truncated = true;
            log::warn!(
                "{} runs past the end of the source ({}), exporting {:.1}s",
                clip.title,
                format_time(total),
                duration
            );
        }
    }

    let samples = if duration > 0.0 {
        source.read_segment(start, duration)?
    } else {
        Vec::new()
    };

    let sample_rate = source.sample_rate();
    let source_channels = source.channels().max(1);
    let frames = samples.len() / usize::from(source_channels);
    let expected_frames = (duration * f64::from(sample_rate)).round() as usize;
    if frames < expected_frames {
        truncated = true;
        log::warn!(
            "Source ended early: wrote {} of {} frames for {}",
            frames,
            expected_frames,
            clip.title
        );
    }

    let (channels, data) = match layout {
        ChannelLayout::Preserve => (source_channels, samples),
        ChannelLayout::Mono => (1, downmix(&samples, source_channels)),
    };
    write_wav(dest, sample_rate, channels, &data)?;

    let written = frames as f64 / f64::from(sample_rate.max(1));
    log::info!("Exported {:.1}s to {}", written, dest.display());

    Ok(ExportSummary {
        clip_id: clip.id,
        path: dest.to_path_buf(),
        start,
        duration: written,
        truncated,
        sample_rate,
        channels,
        frames,
    })
}

/// Averages interleaved frames into a single channel
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn write_wav(dest: &Path, sample_rate: u32, channels: u16, samples: &[f32]) -> EngineResult<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(dest, spec).map_err(|e| EngineError::Export(e.to_string()))?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer
            .write_sample(value)
            .map_err(|e| EngineError::Export(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| EngineError::Export(e.to_string()))?;
    Ok(())
}

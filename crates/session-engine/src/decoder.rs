// crates/session-engine/src/decoder.rs

use crate::error::{EngineError, EngineResult};
use crate::export::PcmSource;
use std::path::Path;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};

/// Decodes an audiobook file into interleaved `f32` samples
pub struct AudioDecoder {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: SignalSpec,
    time_base: Option<TimeBase>,
    n_frames: Option<u64>,
}

pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub spec: SignalSpec,
}

impl AudioDecoder {
    pub fn open(path: &Path) -> EngineResult<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| EngineError::Decode(format!("Failed to open {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EngineError::Decode(format!("Failed to probe format: {}", e)))?;

        let reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| EngineError::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::Decode(format!("Failed to create decoder: {}", e)))?;

        let spec = SignalSpec::new(
            codec_params.sample_rate.unwrap_or(44100),
            codec_params.channels.unwrap_or_default(),
        );

        Ok(Self {
            reader,
            decoder,
            track_id,
            spec,
            time_base: codec_params.time_base,
            n_frames: codec_params.n_frames,
        })
    }

    pub fn decode_next(&mut self) -> EngineResult<Option<DecodedAudio>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(EngineError::Decode(format!("Failed to read packet: {}", e)));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(EngineError::Decode(format!("Failed to decode packet: {}", e)));
                }
            };

            let spec = *decoded.spec();
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            self.spec = spec;

            return Ok(Some(DecodedAudio {
                samples: buffer.samples().to_vec(),
                spec,
            }));
        }
    }

    pub fn spec(&self) -> &SignalSpec {
        &self.spec
    }

    /// Seeks to `time_secs`; returns how many frames precede the exact target
    /// in the next decoded packet
    pub fn seek(&mut self, time_secs: f64) -> EngineResult<u64> {
        let time_secs = time_secs.max(0.0);
        let seeked = self
            .reader
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time: Time::new(time_secs.trunc() as u64, time_secs.fract()),
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| EngineError::Seek(format!("Failed to seek: {}", e)))?;

        self.decoder.reset();

        let lead_in = seeked.required_ts.saturating_sub(seeked.actual_ts);
        Ok(match self.time_base {
            Some(time_base) => {
                (self.ts_to_secs(time_base, lead_in) * f64::from(self.spec.rate)).round() as u64
            }
            None => lead_in,
        })
    }

    fn ts_to_secs(&self, time_base: TimeBase, ts: u64) -> f64 {
        let time = time_base.calc_time(ts);
        time.seconds as f64 + time.frac
    }
}

impl PcmSource for AudioDecoder {
    fn sample_rate(&self) -> u32 {
        self.spec.rate
    }

    fn channels(&self) -> u16 {
        self.spec.channels.count().max(1) as u16
    }

    fn duration_secs(&self) -> Option<f64> {
        let frames = self.n_frames?;
        Some(match self.time_base {
            Some(time_base) => self.ts_to_secs(time_base, frames),
            None => frames as f64 / f64::from(self.spec.rate),
        })
    }

    fn read_segment(&mut self, start: f64, duration: f64) -> EngineResult<Vec<f32>> {
        let mut skip_frames = usize::try_from(self.seek(start)?).unwrap_or(usize::MAX);
        let frames_wanted = (duration.max(0.0) * f64::from(self.spec.rate)).round() as usize;

        let mut out = Vec::new();
        let mut frames = 0;
        while frames < frames_wanted {
            let Some(chunk) = self.decode_next()? else {
                break;
            };
            let channels = chunk.spec.channels.count().max(1);
            let chunk_frames = chunk.samples.len() / channels;

            let skipped = skip_frames.min(chunk_frames);
            skip_frames -= skipped;

            let take = (frames_wanted - frames).min(chunk_frames - skipped);
            let begin = skipped * channels;
            out.extend_from_slice(&chunk.samples[begin..begin + take * channels]);
            frames += take;
        }

        Ok(out)
    }
}

//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Timing constants and defaults of the playback session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Delay after the last change before the session is written
    pub save_debounce_ms: u64,

    /// Accumulated listening seconds between flushes into the day bucket
    pub listening_flush_secs: u64,

    /// Gap between raw button presses that still counts as a hold
    pub long_press_threshold_ms: u64,

    /// Length of the trailing window captured by a clip
    pub clip_length_secs: f64,

    /// Playback position required before a clip can be created
    pub min_clip_position_secs: f64,

    /// Volume change per volume up/down action (0-1 scale)
    pub volume_step: f64,

    /// Volume applied on startup (0-1)
    pub default_volume: f64,

    /// Playback rate applied on startup
    pub default_rate: f64,

    /// Sleep timer choices offered to the user, in minutes
    pub sleep_timer_presets: Vec<u32>,

    /// Playback rates offered to the user
    pub playback_rates: Vec<f64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 2000,
            listening_flush_secs: 15,
            long_press_threshold_ms: 400,
            clip_length_secs: 60.0,
            min_clip_position_secs: 1.0,
            volume_step: 0.1,
            default_volume: 1.0,
            default_rate: 1.0,
            sleep_timer_presets: vec![5, 10, 15, 30, 45, 60],
            playback_rates: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.save_debounce_ms, 100, 60_000, "player.save_debounce_ms"),
            Validator::in_range(
                self.listening_flush_secs,
                1,
                600,
                "player.listening_flush_secs",
            ),
            Validator::in_range(
                self.long_press_threshold_ms,
                50,
                5_000,
                "player.long_press_threshold_ms",
            ),
            Validator::finite_in_range(
                self.clip_length_secs,
                1.0,
                600.0,
                "player.clip_length_secs",
            ),
            Validator::finite_in_range(
                self.min_clip_position_secs,
                0.0,
                60.0,
                "player.min_clip_position_secs",
            ),
            Validator::finite_in_range(self.volume_step, 0.01, 0.5, "player.volume_step"),
            Validator::finite_in_range(self.default_volume, 0.0, 1.0, "player.default_volume"),
            Validator::finite_in_range(self.default_rate, 0.25, 4.0, "player.default_rate"),
            Validator::non_empty_list(&self.sleep_timer_presets, "player.sleep_timer_presets"),
            Validator::strictly_ascending(
                &self.sleep_timer_presets,
                "player.sleep_timer_presets",
            ),
            Validator::non_empty_list(&self.playback_rates, "player.playback_rates"),
            Validator::strictly_ascending(&self.playback_rates, "player.playback_rates"),
        ];

        if self.sleep_timer_presets.contains(&0) {
            results.push(Err(ValidationError::new(
                "player.sleep_timer_presets",
                "must be at least one minute each",
            )));
        }

        for (i, rate) in self.playback_rates.iter().enumerate() {
            results.push(Validator::finite_in_range(
                *rate,
                0.25,
                4.0,
                &format!("player.playback_rates[{}]", i),
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.save_debounce_ms = other.save_debounce_ms;
        self.listening_flush_secs = other.listening_flush_secs;
        self.long_press_threshold_ms = other.long_press_threshold_ms;
        self.clip_length_secs = other.clip_length_secs;
        self.min_clip_position_secs = other.min_clip_position_secs;
        self.volume_step = other.volume_step;
        self.default_volume = other.default_volume;
        self.default_rate = other.default_rate;
        self.sleep_timer_presets = other.sleep_timer_presets;
        self.playback_rates = other.playback_rates;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

//! Chapter index and chapter list normalisation

use crate::types::Chapter;
use serde::{Deserialize, Serialize};

/// Title given to the synthetic opening chapter
pub const INTRODUCTION_TITLE: &str = "Introduction";

/// Parsed chapters starting later than this get an introduction prepended
const INTRODUCTION_GAP_SECS: f64 = 1.0;

/// Raw chapter entry as produced by a chapter parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedChapter {
    pub title: String,
    pub start_time: f64,
}

impl ParsedChapter {
    pub fn new(title: impl Into<String>, start_time: f64) -> Self {
        Self {
            title: title.into(),
            start_time,
        }
    }
}

/// Returns the index of the chapter covering `time`
///
/// This is the greatest `i` with `chapters[i].start_time <= time`. Times
/// before the first chapter, and empty lists, resolve to 0.
pub fn locate(chapters: &[Chapter], time: f64) -> usize {
    chapters
        .partition_point(|c| c.start_time <= time)
        .saturating_sub(1)
}

/// Chapter list used when nothing could be parsed
pub fn fallback_chapters() -> Vec<Chapter> {
    vec![Chapter::new(1, "Start", 0.0)]
}

/// Turns parser output into a valid chapter list
///
/// Entries with non-finite or negative start times are dropped, the rest are
/// sorted by start time and numbered from 1. The list always starts at 0 with
/// an "Introduction" chapter: either the first parsed chapter is renamed, or
/// a new one is prepended when the first parsed chapter starts after 1 s.
pub fn normalize_chapters(parsed: Vec<ParsedChapter>) -> Vec<Chapter> {
    let mut entries: Vec<ParsedChapter> = parsed
        .into_iter()
        .filter(|c| c.start_time.is_finite() && c.start_time >= 0.0)
        .enumerate()
        .map(|(i, mut c)| {
            if c.title.trim().is_empty() {
                c.title = format!("Chapter {}", i + 1);
            } else {
                c.title = c.title.trim().to_string();
            }
            c
        })
        .collect();

    entries.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    match entries.first_mut() {
        Some(first) if first.start_time <= INTRODUCTION_GAP_SECS => {
            first.title = INTRODUCTION_TITLE.to_string();
            first.start_time = 0.0;
        }
        _ => entries.insert(0, ParsedChapter::new(INTRODUCTION_TITLE, 0.0)),
    }

    entries
        .into_iter()
        .zip(1u32..)
        .map(|(c, id)| Chapter::new(id, c.title, c.start_time))
        .collect()
}

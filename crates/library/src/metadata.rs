// crates/library/src/metadata.rs

use lofty::prelude::*;
use lofty::probe::Probe;
use std::io::Cursor;

/// Descriptive tags read from an audio file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTags {
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    /// Duration in seconds, when the container reports it
    pub duration: Option<f64>,
}

/// Reads title/author/narrator tags with `lofty`
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts tags from in-memory file contents
    ///
    /// Files lofty cannot read yield empty tags rather than an error.
    pub fn extract(&self, bytes: &[u8]) -> ExtractedTags {
        let probe = match Probe::new(Cursor::new(bytes)).guess_file_type() {
            Ok(probe) => probe,
            Err(e) => {
                log::debug!("Could not probe file for tags: {}", e);
                return ExtractedTags::default();
            }
        };

        let tagged_file = match probe.read() {
            Ok(file) => file,
            Err(e) => {
                log::debug!("Could not read tags: {}", e);
                return ExtractedTags::default();
            }
        };

        let duration = tagged_file.properties().duration().as_secs_f64();
        let mut tags = ExtractedTags {
            duration: (duration > 0.0).then_some(duration),
            ..Default::default()
        };

        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            return tags;
        };

        tags.title = clean(tag.title().as_deref());
        tags.author = clean(tag.artist().as_deref())
            .or_else(|| clean(tag.get_string(&ItemKey::AlbumArtist)));
        tags.narrator = clean(tag.get_string(&ItemKey::Composer));
        tags
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

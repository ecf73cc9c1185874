//! Best-effort cover art and genre lookups
//!
//! Both services are optional. Any failure, or an answer that cannot be
//! used, quietly falls back to a generated cover or the default genre.

use smartbook_core::Result;

/// Genres a classifier may assign
pub const GENRES: [&str; 6] = [
    "Sci-Fi",
    "Fantasy",
    "Mystery",
    "Non-Fiction",
    "Thriller",
    "Biography",
];

pub const DEFAULT_GENRE: &str = "Non-Fiction";

const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Characters of the title shown on a generated cover
const PLACEHOLDER_TITLE_CHARS: usize = 20;

/// Finds cover art for a book
pub trait CoverLookup: Send + Sync {
    /// Returns an image reference, or `None` when nothing matched
    fn lookup_cover(&self, title: &str, author: &str) -> Result<Option<String>>;
}

/// Assigns a genre label to a title
pub trait GenreClassifier: Send + Sync {
    fn classify_genre(&self, title: &str) -> Result<String>;
}

/// Cover art for a book, or a generated placeholder
pub fn resolve_cover(lookup: Option<&dyn CoverLookup>, title: &str, author: &str) -> String {
    let Some(lookup) = lookup else {
        return placeholder_cover(title);
    };

    // An unknown author only adds noise to the query
    let author = if author == UNKNOWN_AUTHOR { "" } else { author };
    match lookup.lookup_cover(title, author) {
        Ok(Some(cover)) if !cover.trim().is_empty() => cover,
        Ok(_) => {
            log::debug!("No cover found for '{}'", title);
            placeholder_cover(title)
        }
        Err(e) => {
            log::warn!("Cover lookup failed: {}", e);
            placeholder_cover(title)
        }
    }
}

/// Genre for a title, limited to [`GENRES`]
pub fn resolve_genre(classifier: Option<&dyn GenreClassifier>, title: &str) -> String {
    let Some(classifier) = classifier else {
        return DEFAULT_GENRE.to_string();
    };

    let cleaned = clean_title(title);
    match classifier.classify_genre(&cleaned) {
        Ok(answer) => match canonical_genre(&answer) {
            Some(genre) => genre.to_string(),
            None => {
                log::warn!("Unexpected genre '{}', using {}", answer.trim(), DEFAULT_GENRE);
                DEFAULT_GENRE.to_string()
            }
        },
        Err(e) => {
            log::warn!("Genre lookup failed: {}", e);
            DEFAULT_GENRE.to_string()
        }
    }
}

/// Matches an answer against [`GENRES`], ignoring case
pub fn canonical_genre(answer: &str) -> Option<&'static str> {
    let answer = answer.trim();
    GENRES
        .iter()
        .copied()
        .find(|genre| genre.eq_ignore_ascii_case(answer))
}

/// Strips the file extension, an "audiobook" marker and underscores
pub fn clean_title(title: &str) -> String {
    let mut title = title.trim().to_string();

    if let Some((stem, ext)) = title.rsplit_once('.') {
        if ["m4b", "mp3", "wav", "aac", "ogg"]
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
        {
            title = stem.to_string();
        }
    }

    for marker in ["(audiobook)", "[audiobook]", "audiobook"] {
        if let Some(start) = title.to_ascii_lowercase().find(marker) {
            title.replace_range(start..start + marker.len(), "");
            break;
        }
    }

    title.replace('_', " ").trim().to_string()
}

/// Inline SVG cover showing the start of the title
pub fn placeholder_cover(title: &str) -> String {
    let label: String = title
        .chars()
        .take(PLACEHOLDER_TITLE_CHARS)
        .map(|c| match c {
            '<' | '>' | '&' | '\'' | '"' | '#' | '%' => ' ',
            c => c,
        })
        .collect();

    format!(
        "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='200' height='300' \
         viewBox='0 0 200 300'%3E%3Crect width='200' height='300' fill='%231f2937'/%3E\
         %3Ctext x='100' y='140' text-anchor='middle' fill='white' font-size='12' \
         font-family='sans-serif'%3E{}%3C/text%3E%3Ctext x='100' y='160' text-anchor='middle' \
         fill='white' font-size='12' font-family='sans-serif'%3EAudiobook%3C/text%3E%3C/svg%3E",
        label
    )
}

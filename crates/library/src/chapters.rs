//! Chapter extraction from audiobook containers

use smartbook_core::{
    fallback_chapters, normalize_chapters, AppError, Chapter, ParsedChapter, Result,
};

/// Nero chapter start times are in 100 ns units
const CHPL_TIME_SCALE: f64 = 10_000_000.0;

/// Upper bound on samples read from a chapter track
const MAX_CHAPTER_SAMPLES: usize = 10_000;

/// Reads the chapter list embedded in an audio file
pub trait ChapterParser: Send + Sync {
    /// Raw chapters in file order; an empty list means the file has none
    fn parse(&self, bytes: &[u8]) -> Result<Vec<ParsedChapter>>;

    /// Normalised chapters, or a single chapter at 0 when none can be read
    fn chapters_or_fallback(&self, bytes: &[u8]) -> Vec<Chapter> {
        match self.parse(bytes) {
            Ok(parsed) if !parsed.is_empty() => normalize_chapters(parsed),
            Ok(_) => {
                log::debug!("No chapters in file, using a single chapter");
                fallback_chapters()
            }
            Err(e) => {
                log::warn!("{}; using a single chapter", e);
                fallback_chapters()
            }
        }
    }
}

/// Parser for MP4-family audiobooks (M4B/M4A)
///
/// Reads the QuickTime text chapter track when the file has one, otherwise
/// the Nero `chpl` box under `moov/udta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp4ChapterParser;

impl Mp4ChapterParser {
    pub fn new() -> Self {
        Self
    }

    /// File extensions this parser understands
    pub fn handles_extension(ext: &str) -> bool {
        ["m4b", "m4a", "mp4"]
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl ChapterParser for Mp4ChapterParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<ParsedChapter>> {
        let moov = find_box(bytes, b"moov")?.ok_or_else(|| parse_error("no moov box"))?;

        for (kind, trak) in boxes(moov)? {
            if kind != b"trak" {
                continue;
            }
            if let Some(chapters) = read_text_track(bytes, trak)? {
                if !chapters.is_empty() {
                    return Ok(chapters);
                }
            }
        }

        let Some(udta) = find_box(moov, b"udta")? else {
            return Ok(Vec::new());
        };
        let Some(chpl) = find_box(udta, b"chpl")? else {
            return Ok(Vec::new());
        };
        read_chpl(chpl)
    }
}

/// Parser for formats without chapter support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChapters;

impl ChapterParser for NoChapters {
    fn parse(&self, _bytes: &[u8]) -> Result<Vec<ParsedChapter>> {
        Ok(Vec::new())
    }
}

fn parse_error(reason: impl Into<String>) -> AppError {
    AppError::ChapterParse {
        reason: reason.into(),
    }
}

/// Splits one level of boxes into `(type, body)` pairs
fn boxes(mut data: &[u8]) -> Result<Vec<(&[u8], &[u8])>> {
    let mut found = Vec::new();
    while data.len() >= 8 {
        let mut reader = Reader::new(data);
        let size = reader.u32()?;
        let name = reader.take(4)?;

        let (header, size) = match size {
            0 => (8, data.len() as u64),
            1 => (16, reader.u64()?),
            n => (8, u64::from(n)),
        };
        let size = usize::try_from(size).map_err(|_| parse_error("box too large"))?;
        if size < header || size > data.len() {
            return Err(parse_error(format!(
                "box '{}' has an invalid size",
                String::from_utf8_lossy(name)
            )));
        }

        found.push((name, &data[header..size]));
        data = &data[size..];
    }
    Ok(found)
}

/// Returns the body of the first box of type `kind` at this level
fn find_box<'a>(data: &'a [u8], kind: &[u8; 4]) -> Result<Option<&'a [u8]>> {
    Ok(boxes(data)?
        .into_iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, body)| body))
}

fn required_box<'a>(data: &'a [u8], kind: &[u8; 4]) -> Result<&'a [u8]> {
    find_box(data, kind)?.ok_or_else(|| {
        parse_error(format!(
            "chapter track has no '{}' box",
            String::from_utf8_lossy(kind)
        ))
    })
}

/// Chapters from a `trak` whose handler is a text track, `None` for other tracks
///
/// Sample offsets are absolute, so `file` is the whole file.
fn read_text_track(file: &[u8], trak: &[u8]) -> Result<Option<Vec<ParsedChapter>>> {
    let Some(mdia) = find_box(trak, b"mdia")? else {
        return Ok(None);
    };
    let Some(hdlr) = find_box(mdia, b"hdlr")? else {
        return Ok(None);
    };
    let mut reader = Reader::new(hdlr);
    reader.take(8)?; // version, flags, pre_defined
    let handler = reader.take(4)?;
    if handler != b"text" && handler != b"sbtl" {
        return Ok(None);
    }

    let timescale = read_timescale(required_box(mdia, b"mdhd")?)?;
    let stbl = required_box(required_box(mdia, b"minf")?, b"stbl")?;

    let starts = read_stts(required_box(stbl, b"stts")?)?;
    let sizes = read_stsz(required_box(stbl, b"stsz")?)?;
    let per_chunk = read_stsc(required_box(stbl, b"stsc")?)?;
    let chunks = match find_box(stbl, b"stco")? {
        Some(stco) => read_chunk_offsets(stco, false)?,
        None => read_chunk_offsets(required_box(stbl, b"co64")?, true)?,
    };
    let offsets = sample_offsets(&sizes, &per_chunk, &chunks);

    let mut chapters = Vec::new();
    for (index, ((start, offset), size)) in starts.iter().zip(&offsets).zip(&sizes).enumerate() {
        let sample = usize::try_from(*offset)
            .ok()
            .and_then(|offset| file.get(offset..))
            .and_then(|rest| rest.get(..*size as usize))
            .ok_or_else(|| parse_error("chapter sample lies outside the file"))?;

        // A text sample is a 16-bit length followed by UTF-8
        if sample.len() < 2 {
            continue;
        }
        let mut reader = Reader::new(sample);
        let len = reader.u16()?;
        let title = String::from_utf8_lossy(reader.take(usize::from(len))?).into_owned();
        let title = if title.trim().is_empty() {
            format!("Chapter {}", index + 1)
        } else {
            title
        };
        chapters.push(ParsedChapter::new(title, *start as f64 / f64::from(timescale)));
    }
    Ok(Some(chapters))
}

fn read_timescale(mdhd: &[u8]) -> Result<u32> {
    let mut reader = Reader::new(mdhd);
    let version = reader.u8()?;
    reader.take(3)?;
    // creation and modification times
    reader.take(if version == 1 { 16 } else { 8 })?;
    match reader.u32()? {
        0 => Err(parse_error("chapter track has a zero timescale")),
        timescale => Ok(timescale),
    }
}

/// Decode time of every sample, in track ticks
fn read_stts(body: &[u8]) -> Result<Vec<u64>> {
    let mut reader = Reader::new(body);
    reader.take(4)?;
    let entries = reader.u32()?;

    let mut starts = Vec::new();
    let mut tick = 0u64;
    for _ in 0..entries {
        let count = reader.u32()? as usize;
        let delta = u64::from(reader.u32()?);
        if starts.len() + count > MAX_CHAPTER_SAMPLES {
            return Err(parse_error("chapter track has too many samples"));
        }
        for _ in 0..count {
            starts.push(tick);
            tick = tick.saturating_add(delta);
        }
    }
    Ok(starts)
}

fn read_stsz(body: &[u8]) -> Result<Vec<u32>> {
    let mut reader = Reader::new(body);
    reader.take(4)?;
    let uniform = reader.u32()?;
    let count = reader.u32()? as usize;
    if count > MAX_CHAPTER_SAMPLES {
        return Err(parse_error("chapter track has too many samples"));
    }

    if uniform != 0 {
        return Ok(vec![uniform; count]);
    }
    (0..count).map(|_| reader.u32()).collect()
}

/// `(first_chunk, samples_per_chunk)` runs
fn read_stsc(body: &[u8]) -> Result<Vec<(u32, u32)>> {
    let mut reader = Reader::new(body);
    reader.take(4)?;
    let entries = reader.u32()?;
    let mut runs = Vec::new();
    for _ in 0..entries {
        let first_chunk = reader.u32()?;
        let samples = reader.u32()?;
        reader.take(4)?; // sample description index
        runs.push((first_chunk, samples));
    }
    Ok(runs)
}

fn read_chunk_offsets(body: &[u8], wide: bool) -> Result<Vec<u64>> {
    let mut reader = Reader::new(body);
    reader.take(4)?;
    let count = reader.u32()?;
    let mut offsets = Vec::new();
    for _ in 0..count {
        offsets.push(if wide {
            reader.u64()?
        } else {
            u64::from(reader.u32()?)
        });
    }
    Ok(offsets)
}

/// File offset of every sample, walking chunks in order
fn sample_offsets(sizes: &[u32], runs: &[(u32, u32)], chunks: &[u64]) -> Vec<u64> {
    let mut offsets = Vec::with_capacity(sizes.len());
    let mut sizes = sizes.iter();

    for (number, chunk_start) in (1u32..).zip(chunks) {
        let per_chunk = runs
            .iter()
            .rev()
            .find(|(first, _)| *first <= number)
            .map_or(0, |(_, samples)| *samples);

        let mut offset = *chunk_start;
        for _ in 0..per_chunk {
            let Some(size) = sizes.next() else {
                return offsets;
            };
            offsets.push(offset);
            offset = offset.saturating_add(u64::from(*size));
        }
    }
    offsets
}

fn read_chpl(body: &[u8]) -> Result<Vec<ParsedChapter>> {
    let mut reader = Reader::new(body);
    let version = reader.u8()?;
    reader.take(3)?; // flags
    if version > 0 {
        reader.take(4)?;
    }

    let count = reader.u8()?;
    let mut chapters = Vec::with_capacity(usize::from(count));
    for index in 0..count {
        let start = reader.u64()? as f64 / CHPL_TIME_SCALE;
        let len = reader.u8()?;
        let title = String::from_utf8_lossy(reader.take(usize::from(len))?).into_owned();
        let title = if title.trim().is_empty() {
            format!("Chapter {}", index + 1)
        } else {
            title
        };
        chapters.push(ParsedChapter::new(title, start));
    }
    Ok(chapters)
}

/// Big-endian cursor that fails instead of panicking on short input
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| parse_error("unexpected end of data"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.take(2)?);
        Ok(u16::from_be_bytes(buf))
    }

    fn u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }
}

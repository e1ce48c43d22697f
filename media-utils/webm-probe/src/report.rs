use std::collections::BTreeMap;
use std::io::{Read, Seek};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::reader::{ElementReader, Header};
use crate::tags::Tag;
use crate::vint::ElementSize;

/// Matroska default: one tick is one millisecond.
pub const DEFAULT_TIMESTAMP_SCALE_NANOS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other(u64),
}

impl From<u64> for TrackKind {
    fn from(track_type: u64) -> Self {
        match track_type {
            1 => TrackKind::Video,
            2 => TrackKind::Audio,
            0x11 => TrackKind::Subtitle,
            other => TrackKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub number: u64,
    pub kind: Option<TrackKind>,
    pub codec_id: Option<String>,
    /// Blocks seen for this track number.
    pub blocks: usize,
}

/// Something that makes a file hard to seek in or play back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    MissingDuration,
    MissingCues,
    UnknownSizeSegment,
    UnknownSizeClusters,
    Truncated,
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Problem::MissingDuration => "segment info has no duration",
            Problem::MissingCues => "no cues (seek index)",
            Problem::UnknownSizeSegment => "segment has unknown size",
            Problem::UnknownSizeClusters => "clusters with unknown size",
            Problem::Truncated => "file is truncated",
        };
        f.write_str(msg)
    }
}

/// Summary of a WebM or Matroska file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub doc_type: String,
    pub timestamp_scale_nanos: u64,
    /// Duration declared in the segment info.
    pub duration_secs: Option<f64>,
    /// Largest block timestamp found in the clusters.
    pub observed_duration_secs: Option<f64>,
    pub title: Option<String>,
    pub muxing_app: Option<String>,
    pub writing_app: Option<String>,
    pub tracks: Vec<TrackSummary>,
    pub tags: BTreeMap<String, String>,
    pub has_seek_head: bool,
    pub cue_points: usize,
    pub clusters: usize,
    pub blocks: usize,
    pub laced_blocks: usize,
    pub unknown_size_segment: bool,
    pub unknown_size_clusters: usize,
    pub truncated: bool,
}

impl ProbeReport {
    pub fn problems(&self) -> Vec<Problem> {
        let mut problems = Vec::new();
        if self.duration_secs.is_none() {
            problems.push(Problem::MissingDuration);
        }
        if self.cue_points == 0 {
            problems.push(Problem::MissingCues);
        }
        if self.unknown_size_segment {
            problems.push(Problem::UnknownSizeSegment);
        }
        if self.unknown_size_clusters > 0 {
            problems.push(Problem::UnknownSizeClusters);
        }
        if self.truncated {
            problems.push(Problem::Truncated);
        }
        problems
    }

    pub fn needs_repair(&self) -> bool {
        !self.problems().is_empty()
    }
}

#[derive(Debug, Default)]
struct Accum {
    doc_type: Option<String>,
    timestamp_scale_nanos: Option<u64>,
    duration_ticks: Option<f64>,
    max_block_ticks: Option<i64>,
    title: Option<String>,
    muxing_app: Option<String>,
    writing_app: Option<String>,
    tracks: Vec<TrackSummary>,
    tags: BTreeMap<String, String>,
    has_seek_head: bool,
    cue_points: usize,
    clusters: usize,
    blocks: usize,
    laced_blocks: usize,
    unknown_size_segment: bool,
    unknown_size_clusters: usize,
    truncated: bool,
}

impl From<Accum> for ProbeReport {
    fn from(a: Accum) -> Self {
        let scale = a
            .timestamp_scale_nanos
            .unwrap_or(DEFAULT_TIMESTAMP_SCALE_NANOS) as f64;
        let ticks_to_secs = |ticks: f64| ticks * scale / 1e9;
        Self {
            doc_type: a.doc_type.unwrap_or_else(|| "matroska".to_string()),
            timestamp_scale_nanos: a
                .timestamp_scale_nanos
                .unwrap_or(DEFAULT_TIMESTAMP_SCALE_NANOS),
            duration_secs: a.duration_ticks.map(ticks_to_secs),
            observed_duration_secs: a.max_block_ticks.map(|t| ticks_to_secs(t as f64)),
            title: a.title,
            muxing_app: a.muxing_app,
            writing_app: a.writing_app,
            tracks: a.tracks,
            tags: a.tags,
            has_seek_head: a.has_seek_head,
            cue_points: a.cue_points,
            clusters: a.clusters,
            blocks: a.blocks,
            laced_blocks: a.laced_blocks,
            unknown_size_segment: a.unknown_size_segment,
            unknown_size_clusters: a.unknown_size_clusters,
            truncated: a.truncated,
        }
    }
}

/// Call `f` for each child of `parent`.
///
/// For an unknown-size parent, children end at the end of the input or at
/// the next boundary element, which is left unread.
fn for_each_child<R, F>(rdr: &mut ElementReader<R>, parent: &Header, mut f: F) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(&mut ElementReader<R>, &Header) -> Result<()>,
{
    let end = parent.end().unwrap_or(rdr.len());
    while rdr.position() < end {
        let child = rdr.next_header()?.ok_or(Error::Eof)?;
        if parent.size == ElementSize::Unknown && child.tag.is_boundary() {
            rdr.seek_to(child.position)?;
            break;
        }
        f(rdr, &child)?;
    }
    Ok(())
}

fn parse_ebml_header<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    accum: &mut Accum,
) -> Result<()> {
    let header = match rdr.next_header() {
        Ok(Some(header)) if header.tag == Tag::EBML => header,
        Ok(_) | Err(Error::Eof | Error::InvalidId | Error::InvalidSize) => {
            return Err(Error::NotEbml);
        }
        Err(e) => return Err(e),
    };
    if header.size == ElementSize::Unknown {
        return Err(Error::NotEbml);
    }
    for_each_child(rdr, &header, |rdr, child| {
        match child.tag {
            Tag::DocType => accum.doc_type = Some(rdr.read_string(child)?),
            _ => rdr.skip(child)?,
        }
        Ok(())
    })
}

fn parse_info<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    info: &Header,
    accum: &mut Accum,
) -> Result<()> {
    for_each_child(rdr, info, |rdr, child| {
        match child.tag {
            Tag::TimestampScale => accum.timestamp_scale_nanos = Some(rdr.read_uint(child)?),
            Tag::Duration => accum.duration_ticks = Some(rdr.read_float(child)?),
            Tag::Title => accum.title = Some(rdr.read_string(child)?),
            Tag::MuxingApp => accum.muxing_app = Some(rdr.read_string(child)?),
            Tag::WritingApp => accum.writing_app = Some(rdr.read_string(child)?),
            _ => rdr.skip(child)?,
        }
        Ok(())
    })
}

fn parse_tracks<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    tracks: &Header,
    accum: &mut Accum,
) -> Result<()> {
    for_each_child(rdr, tracks, |rdr, entry| {
        if entry.tag != Tag::TrackEntry {
            return rdr.skip(entry);
        }
        let mut track = TrackSummary {
            number: 0,
            kind: None,
            codec_id: None,
            blocks: 0,
        };
        for_each_child(rdr, entry, |rdr, child| {
            match child.tag {
                Tag::TrackNumber => track.number = rdr.read_uint(child)?,
                Tag::TrackType => track.kind = Some(rdr.read_uint(child)?.into()),
                Tag::CodecID => track.codec_id = Some(rdr.read_string(child)?),
                _ => rdr.skip(child)?,
            }
            Ok(())
        })?;
        accum.tracks.push(track);
        Ok(())
    })
}

fn parse_tags<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    tags: &Header,
    accum: &mut Accum,
) -> Result<()> {
    for_each_child(rdr, tags, |rdr, tag| {
        if tag.tag != Tag::TagElement {
            return rdr.skip(tag);
        }
        for_each_child(rdr, tag, |rdr, simple_tag| {
            if simple_tag.tag != Tag::SimpleTag {
                return rdr.skip(simple_tag);
            }
            let mut name = None;
            let mut value = None;
            for_each_child(rdr, simple_tag, |rdr, child| {
                match child.tag {
                    Tag::TagName => name = Some(rdr.read_string(child)?),
                    Tag::TagString => value = Some(rdr.read_string(child)?),
                    _ => rdr.skip(child)?,
                }
                Ok(())
            })?;
            if let Some(name) = name {
                accum.tags.insert(name, value.unwrap_or_default());
            }
            Ok(())
        })
    })
}

fn record_block<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    block: &Header,
    cluster_ticks: u64,
    accum: &mut Accum,
) -> Result<()> {
    let header = rdr.read_block_header(block)?;
    accum.blocks += 1;
    if header.is_laced() {
        accum.laced_blocks += 1;
    }
    if let Some(track) = accum
        .tracks
        .iter_mut()
        .find(|t| t.number == header.track_number)
    {
        track.blocks += 1;
    }
    let ticks = cluster_ticks as i64 + i64::from(header.relative_timestamp);
    accum.max_block_ticks = Some(accum.max_block_ticks.map_or(ticks, |m| m.max(ticks)));
    Ok(())
}

fn parse_cluster<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    cluster: &Header,
    accum: &mut Accum,
) -> Result<()> {
    accum.clusters += 1;
    if cluster.size == ElementSize::Unknown {
        accum.unknown_size_clusters += 1;
    }
    let mut cluster_ticks = 0;
    for_each_child(rdr, cluster, |rdr, child| {
        match child.tag {
            Tag::Timestamp => cluster_ticks = rdr.read_uint(child)?,
            Tag::SimpleBlock => record_block(rdr, child, cluster_ticks, accum)?,
            Tag::BlockGroup => {
                for_each_child(rdr, child, |rdr, grandchild| {
                    if grandchild.tag == Tag::Block {
                        record_block(rdr, grandchild, cluster_ticks, accum)
                    } else {
                        rdr.skip(grandchild)
                    }
                })?;
            }
            _ => rdr.skip(child)?,
        }
        Ok(())
    })
}

fn parse_segment<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    segment: &Header,
    accum: &mut Accum,
) -> Result<()> {
    let end = match segment.end() {
        Some(end) => {
            if end > rdr.len() {
                accum.truncated = true;
            }
            end.min(rdr.len())
        }
        None => {
            accum.unknown_size_segment = true;
            rdr.len()
        }
    };
    while rdr.position() < end {
        let Some(child) = rdr.next_header()? else {
            break;
        };
        match child.tag {
            Tag::SeekHead => {
                accum.has_seek_head = true;
                rdr.skip(&child)?;
            }
            Tag::Info => parse_info(rdr, &child, accum)?,
            Tag::Tracks => parse_tracks(rdr, &child, accum)?,
            Tag::Cluster => parse_cluster(rdr, &child, accum)?,
            Tag::Cues => for_each_child(rdr, &child, |rdr, point| {
                if point.tag == Tag::CuePoint {
                    accum.cue_points += 1;
                }
                rdr.skip(point)
            })?,
            Tag::Tags => parse_tags(rdr, &child, accum)?,
            // A second segment (chained file) ends the walk.
            Tag::Segment | Tag::EBML => break,
            _ => rdr.skip(&child)?,
        }
    }
    Ok(())
}

fn find_and_parse_segment<R: Read + Seek>(
    rdr: &mut ElementReader<R>,
    accum: &mut Accum,
) -> Result<()> {
    while let Some(header) = rdr.next_header()? {
        if header.tag == Tag::Segment {
            return parse_segment(rdr, &header, accum);
        }
        rdr.skip(&header)?;
    }
    Ok(())
}

/// Summarize the file read from `rdr`.
///
/// Only the first Segment is examined. Input that ends in the middle of
/// an element yields a report with `truncated` set.
pub fn probe_reader<R: Read + Seek>(rdr: R) -> Result<ProbeReport> {
    let mut rdr = ElementReader::new(rdr)?;
    let mut accum = Accum::default();
    parse_ebml_header(&mut rdr, &mut accum)?;

    match find_and_parse_segment(&mut rdr, &mut accum) {
        Ok(()) => {}
        Err(e) if e.is_truncation() => {
            tracing::debug!("input ends early: {e}");
            accum.truncated = true;
        }
        Err(e) => return Err(e),
    }
    Ok(accum.into())
}

/// Summarize the file at `path`.
pub fn probe_path<P: AsRef<std::path::Path>>(path: P) -> Result<ProbeReport> {
    let fd = std::fs::File::open(path.as_ref())?;
    let report = probe_reader(std::io::BufReader::new(fd))?;
    tracing::debug!(
        "probed {}: {} clusters, {} blocks",
        path.as_ref().display(),
        report.clusters,
        report.blocks
    );
    Ok(report)
}

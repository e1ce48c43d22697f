//! Summarize WebM and Matroska files.
//!
//! The walk reads element headers and only the leaf values it reports on,
//! skipping frame data. Recordings written by live muxers (unknown-size
//! Segment and Clusters, no Duration, no Cues) and files cut off mid-write
//! are summarized rather than rejected.

pub use error::{Error, Result};
pub use report::{
    DEFAULT_TIMESTAMP_SCALE_NANOS, Problem, ProbeReport, TrackKind, TrackSummary, probe_path,
    probe_reader,
};
pub use tags::Tag;
pub use vint::ElementSize;

mod error;
mod reader;
mod report;
mod tags;
mod vint;

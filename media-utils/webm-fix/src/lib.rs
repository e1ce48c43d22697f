//! Repair WebM recordings.
//!
//! The repair itself is done by a [WebmRepairer]. [NativeRepairer] calls
//! `FixWebmFile` in a dynamically loaded library, [FfmpegRepairer] remuxes
//! with the `ffmpeg` program. [fix_webm_file] checks the paths and makes
//! exactly one repair call.

use std::path::Path;

pub use error::{Error, Result};
pub use ffmpeg::{FfmpegRepairer, is_ffmpeg_available};
pub use metadata::Metadata;
pub use native::NativeRepairer;

mod error;
pub mod ffmpeg;
pub mod metadata;
pub mod native;
pub mod preflight;

/// Integer result of a repair. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    pub const FAILURE: StatusCode = StatusCode(1);

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl From<std::ffi::c_int> for StatusCode {
    fn from(code: std::ffi::c_int) -> Self {
        StatusCode(code)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that can repair a WebM file.
pub trait WebmRepairer {
    /// Short name for log messages.
    fn name(&self) -> &str;

    /// Read `source` and write the repaired file to `destination`.
    ///
    /// `Err` means the repair could not be attempted. A repair that ran and
    /// failed returns a non-zero [StatusCode].
    fn repair(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata,
    ) -> Result<StatusCode>;
}

impl<T: WebmRepairer + ?Sized> WebmRepairer for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn repair(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata,
    ) -> Result<StatusCode> {
        (**self).repair(source, destination, metadata)
    }
}

impl<T: WebmRepairer + ?Sized> WebmRepairer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn repair(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata,
    ) -> Result<StatusCode> {
        (**self).repair(source, destination, metadata)
    }
}

/// Check the paths, then call `repairer` once.
///
/// The returned status is the repairer's, unmodified.
pub fn fix_webm_file(
    repairer: &dyn WebmRepairer,
    source: &Path,
    destination: &Path,
    metadata: &Metadata,
) -> Result<StatusCode> {
    preflight::check_paths(source, destination)?;
    tracing::info!(
        "repairing \"{}\" into \"{}\" ({})",
        source.display(),
        destination.display(),
        repairer.name()
    );
    let status = repairer.repair(source, destination, metadata)?;
    if status.is_success() {
        tracing::debug!("repair succeeded");
    } else {
        tracing::warn!("repair returned status {status}");
    }
    Ok(status)
}

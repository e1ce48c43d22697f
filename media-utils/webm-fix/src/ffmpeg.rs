//! Repair by remuxing through the `ffmpeg` program.
//!
//! Packets are copied without transcoding. Missing presentation timestamps
//! are generated and decode errors in the input are ignored, so a
//! recording that was cut off still yields a file with a duration and a
//! seek index.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    StatusCode, WebmRepairer,
    error::{Error, Result},
    metadata::Metadata,
};

/// Lines of ffmpeg's stderr logged when it fails.
const STDERR_TAIL_LINES: usize = 10;

fn zq(x: &[&str]) -> Vec<OsString> {
    x.iter().map(OsString::from).collect()
}

fn is_mp4(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
}

/// Check if ffmpeg program is available.
pub fn is_ffmpeg_available() -> bool {
    FfmpegRepairer::default().is_available()
}

/// Repairs by remuxing with ffmpeg.
///
/// Only the given metadata is written. No default `comment` tag is added
/// when the metadata is empty.
#[derive(Debug, Clone)]
pub struct FfmpegRepairer {
    program: PathBuf,
}

impl Default for FfmpegRepairer {
    fn default() -> Self {
        Self::with_program("ffmpeg")
    }
}

impl FfmpegRepairer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .is_ok()
    }

    /// Command line arguments (without the program name) for one repair.
    pub fn args(&self, source: &Path, destination: &Path, metadata: &Metadata) -> Vec<OsString> {
        let mut args = zq(&[
            "-hide_banner",
            "-nostdin",
            "-y",
            "-fflags",
            "+genpts",
            "-err_detect",
            "ignore_err",
            "-i",
        ]);
        args.push(source.into());
        // Keep only audio and video streams.
        args.extend(zq(&["-map", "0:v?", "-map", "0:a?", "-c", "copy"]));
        for (key, value) in metadata.tags() {
            args.push("-metadata".into());
            args.push(format!("{key}={value}").into());
        }
        if is_mp4(destination) {
            args.extend(zq(&["-movflags", "+faststart+use_metadata_tags"]));
        }
        args.push(destination.into());
        args
    }
}

impl WebmRepairer for FfmpegRepairer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn repair(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata,
    ) -> Result<StatusCode> {
        let args = self.args(source, destination, metadata);
        tracing::debug!("running {} {:?}", self.program.display(), args);
        let output = match Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FfmpegNotFound {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if output.status.success() {
            Ok(StatusCode::SUCCESS)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
            tracing::warn!("ffmpeg failed ({}):\n{}", output.status, tail.join("\n"));
            Ok(StatusCode::FAILURE)
        }
    }
}

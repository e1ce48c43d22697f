use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use eyre::{self as anyhow, Result, WrapErr};

use webm_fix::{FfmpegRepairer, Metadata, NativeRepairer, StatusCode, WebmRepairer};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    #[default]
    /// Call `FixWebmFile` in the native webm library.
    Native,
    /// Remux with the ffmpeg program.
    Ffmpeg,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Native => write!(f, "native"),
            Self::Ffmpeg => write!(f, "ffmpeg"),
        }
    }
}

/// Repair a WebM recording so that it has a duration and can be seeked.
#[derive(Parser, Debug)]
#[command(name = "fix-webm", author, version, about)]
pub struct Cli {
    /// Recording to repair.
    pub source: PathBuf,

    /// Where to write the repaired file.
    pub destination: PathBuf,

    /// How the repair is done.
    #[arg(long, value_enum, default_value_t)]
    pub backend: Backend,

    /// Native repair library. Defaults to the platform name of `webm`, e.g.
    /// `libwebm.so`.
    #[arg(long, env = "FIXWEBM_LIB")]
    pub library: Option<PathBuf>,

    /// ffmpeg program used with `--backend ffmpeg`.
    #[arg(long, env = "FIXWEBM_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Tag to write into the repaired file. May be given more than once.
    #[arg(short, long = "metadata", value_name = "KEY=VALUE", value_parser = parse_metadata_arg)]
    pub metadata: Vec<(String, String)>,

    /// Probe the repaired file and fail if it still has no duration or is
    /// truncated.
    #[arg(long)]
    pub verify: bool,

    /// Also write log messages to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn parse_metadata_arg(arg: &str) -> std::result::Result<(String, String), String> {
    webm_fix::metadata::parse_key_value(arg).map_err(|e| e.to_string())
}

impl Cli {
    pub fn metadata(&self) -> Metadata {
        self.metadata.iter().cloned().collect()
    }

    /// Construct the repairer selected by `--backend`.
    pub fn build_repairer(&self) -> Result<Box<dyn WebmRepairer>> {
        match self.backend {
            Backend::Native => {
                let repairer = match &self.library {
                    Some(path) => NativeRepairer::from_path(path),
                    None => NativeRepairer::load(),
                }
                .wrap_err("could not load the native repair library")?;
                tracing::debug!(
                    "loaded {} (metadata supported: {})",
                    repairer.path().display(),
                    repairer.supports_metadata()
                );
                Ok(Box::new(repairer))
            }
            Backend::Ffmpeg => Ok(Box::new(FfmpegRepairer::with_program(&self.ffmpeg))),
        }
    }
}

/// Format an argument list as `[a b c]`.
pub fn format_invocation<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .collect();
    format!("[{}]", args.join(" "))
}

/// Echo `args` to `out`, repair once and print the returned status.
///
/// `make_repairer` is called after the echo. A non-zero status is printed
/// and then returned as an error.
pub fn run<W, F, R>(
    args: &[OsString],
    cli: &Cli,
    out: &mut W,
    make_repairer: F,
) -> Result<StatusCode>
where
    W: Write,
    F: FnOnce(&Cli) -> Result<R>,
    R: WebmRepairer,
{
    writeln!(out, "{}", format_invocation(args))?;
    out.flush()?;

    let repairer = make_repairer(cli)?;
    let status = webm_fix::fix_webm_file(&repairer, &cli.source, &cli.destination, &cli.metadata())
        .wrap_err_with(|| format!("while repairing \"{}\"", cli.source.display()))?;

    writeln!(out, "{status}")?;
    out.flush()?;

    if !status.is_success() {
        anyhow::bail!("{} repair returned status {status}", repairer.name());
    }
    if cli.verify {
        verify(&cli.destination)?;
    }
    Ok(status)
}

/// Probe a repaired file.
fn verify(destination: &Path) -> Result<()> {
    let report = webm_probe::probe_path(destination)
        .wrap_err_with(|| format!("while verifying \"{}\"", destination.display()))?;
    for problem in report.problems() {
        tracing::warn!("\"{}\": {problem}", destination.display());
    }
    if report.truncated {
        anyhow::bail!("repaired file \"{}\" is truncated", destination.display());
    }
    let Some(duration) = report.duration_secs else {
        anyhow::bail!("repaired file \"{}\" has no duration", destination.display());
    };
    tracing::info!(
        "verified \"{}\": {duration:.3} s, {} tracks, {} cue points",
        destination.display(),
        report.tracks.len(),
        report.cue_points
    );
    Ok(())
}

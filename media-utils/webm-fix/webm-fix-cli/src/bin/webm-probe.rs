use std::path::PathBuf;

use clap::Parser;
use eyre::{self as anyhow, Result, WrapErr};

/// Print what is known about a WebM or Matroska file as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// File to examine.
    input: PathBuf,

    /// Exit with an error if the file needs repair.
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let _tracing_guard = env_tracing_logger::init();
    let cli = Cli::parse();

    let report = webm_probe::probe_path(&cli.input)
        .wrap_err_with(|| format!("while reading \"{}\"", cli.input.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let problems = report.problems();
    for problem in problems.iter() {
        tracing::info!("{problem}");
    }
    if cli.check && report.needs_repair() {
        anyhow::bail!(
            "\"{}\" needs repair ({} problems)",
            cli.input.display(),
            problems.len()
        );
    }
    Ok(())
}

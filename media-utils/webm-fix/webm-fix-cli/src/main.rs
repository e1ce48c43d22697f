use clap::Parser;
use eyre::{self as anyhow, Result};

use webm_fix_cli::Cli;

fn main() -> Result<()> {
    let args: Vec<std::ffi::OsString> = std::env::args_os().collect();
    let cli = Cli::parse_from(&args);
    let _tracing_guard = env_tracing_logger::initiate_logging(cli.log_file.as_ref(), false)
        .map_err(|e| anyhow::eyre!("could not start logging: {e}"))?;

    let mut stdout = std::io::stdout().lock();
    webm_fix_cli::run(&args, &cli, &mut stdout, Cli::build_repairer)?;
    Ok(())
}

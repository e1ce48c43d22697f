//! Initialize a [tracing] subscriber configured from `RUST_LOG`.
//!
//! Console output goes to stderr so that stdout stays free for the
//! program's own output.

use time::{UtcOffset, format_description::well_known::Iso8601};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
};

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

struct Guard {}

impl Drop for Guard {
    fn drop(&mut self) {}
}

/// Log to the console only.
///
/// Panics if a global subscriber was already installed.
pub fn init() -> impl Drop {
    initiate_logging::<&str>(None, false).unwrap()
}

fn local_timer() -> Result<OffsetTime<Iso8601>, Error> {
    // Fixed offset based on the timezone at the time this runs.
    let offset = UtcOffset::from_whole_seconds(chrono::Local::now().offset().local_minus_utc())?;
    Ok(OffsetTime::new(offset, Iso8601::DEFAULT))
}

/// Start logging to file and console, both optional.
pub fn initiate_logging<P: AsRef<std::path::Path>>(
    path: Option<P>,
    disable_console: bool,
) -> Result<impl Drop, Error> {
    let timer = local_timer()?;

    let file_layer = if let Some(path) = &path {
        let file = std::fs::File::create(path)?;
        Some(
            fmt::layer()
                .with_timer(timer.clone())
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        None
    };

    let console_layer = if disable_console {
        None
    } else {
        let with_ansi = !cfg!(windows);
        Some(
            fmt::layer()
                .with_timer(timer)
                .with_writer(std::io::stderr)
                .with_ansi(with_ansi)
                .with_target(false),
        )
    };

    let collector = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(tracing_subscriber::filter::EnvFilter::from_default_env());
    tracing::subscriber::set_global_default(collector)?;

    let log_var = match std::env::var("RUST_LOG") {
        Ok(var) => format!(" with RUST_LOG=\"{var}\"."),
        Err(_) => ".".to_string(),
    };

    if let Some(path) = &path {
        tracing::debug!(
            "Logging initiated to file \"{}\"{log_var}",
            path.as_ref().display(),
        );
    }

    if !disable_console {
        tracing::debug!("Logging initiated to stderr{log_var}");
    }

    Ok(Guard {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_uses_whole_second_offset() {
        local_timer().unwrap();
    }
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding a tracing filter, e.g. `softsort=debug`.
pub const LOG_ENV_VAR: &str = "SOFTSORT_LOG";

/// Installs the global tracing subscriber.
///
/// `SOFTSORT_LOG` takes precedence; otherwise the level follows the CLI
/// verbosity: 0 = warn, 1 = info, 2 = debug, 3+ = trace. Logs go to stderr so
/// they never mix with the preview table on stdout. Calling this twice is a
/// no-op.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(format!("softsort={}", default_level)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}

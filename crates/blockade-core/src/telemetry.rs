//! Logging setup shared by binaries, benches and tests.

use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber.
///
/// The filter comes from `BLOCKADE_LOG` (falling back to
/// `blockade=info,warn`, or `blockade=debug,info` when `DEBUG` is set) and
/// the output format from `BLOCKADE_LOG_FORMAT` (`json` or `compact`).
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("BLOCKADE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "blockade=debug,info"
        } else {
            "blockade=info,warn"
        })
    });

    let format = env::var("BLOCKADE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    let _ = match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false))
            .try_init(),
        _ => registry.with(fmt::layer().compact()).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("still alive");
    }
}

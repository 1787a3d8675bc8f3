//! Logging initialization for the binary
//!
//! The library only emits `tracing` events; installing a subscriber is up
//! to the binary. Without `--verbose` only errors are shown, so skip
//! warnings are discarded.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter level for a `-v` count: 0 = ERROR, 1 = WARN, 2+ = DEBUG
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        _ => Level::DEBUG,
    }
}

/// Install the stderr subscriber; `RUST_LOG` takes precedence over `verbosity`
///
/// Does nothing if a global subscriber is already set.
pub fn init(verbosity: u8) {
    let level = level_for(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), Level::ERROR);
        assert_eq!(level_for(1), Level::WARN);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(5), Level::DEBUG);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(1);
        init(2);
    }
}

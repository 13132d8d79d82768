//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Installs the global `fmt` subscriber.
///
/// Falls back to `info` when the directive does not parse. Returns false if
/// a subscriber was already installed, which makes repeated calls from
/// tests harmless.
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let config = TelemetryConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }

    #[test]
    fn bad_directive_does_not_panic() {
        let config = TelemetryConfig {
            log_level: "not==valid[".to_string(),
            json: true,
        };
        let _ = init_tracing(&config);
    }
}

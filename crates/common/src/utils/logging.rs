use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset: request spans from tower_http,
/// claim lifecycle events from `service`.
pub const DEFAULT_DIRECTIVES: &str = "info,tower_http=info,service=info";

// 存储层读写日志较多，JSON 模式下默认打开 debug 便于线上排查
const JSON_DIRECTIVES: &str = "info,tower_http=info,service=info,service::storage=debug";

fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Human-readable compact logs on stdout. `RUST_LOG` overrides the defaults.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(filter_or(DEFAULT_DIRECTIVES))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event on stdout, selected with `LOG_FORMAT=json`.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(filter_or(JSON_DIRECTIVES))
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        assert!(DEFAULT_DIRECTIVES.parse::<EnvFilter>().is_ok());
        assert!(JSON_DIRECTIVES.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging_default();
        init_logging_json();
    }
}

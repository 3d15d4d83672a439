//! # Configuration
//!
//! Controller and HTTP server settings.
//!
//! Both are read from environment variables (populated from a ConfigMap with
//! `envFrom` in the deployment) and can be overridden on the command line,
//! see [`crate::cli`].

mod controller;
mod server;

pub use controller::{ControllerConfig, ConvergencePolicy, LogFormat};
pub use server::ServerConfig;

/// Parse a raw value or fall back to the default
pub(crate) fn parse_or_default<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Interpret common truthy spellings, falling back to the default when unset
pub(crate) fn parse_bool_or_default(raw: Option<String>, default: bool) -> bool {
    raw.map_or(default, |v| {
        let v_lower = v.trim().to_lowercase();
        v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default_uses_value() {
        assert_eq!(parse_or_default(Some("42".to_string()), 7u64), 42);
        assert_eq!(parse_or_default(Some(" 42 ".to_string()), 7u64), 42);
    }

    #[test]
    fn test_parse_or_default_falls_back_on_garbage() {
        assert_eq!(parse_or_default(Some("forty".to_string()), 7u64), 7);
        assert_eq!(parse_or_default::<u64>(None, 7), 7);
    }

    #[test]
    fn test_parse_bool_or_default() {
        for truthy in ["true", "TRUE", "1", "yes", "on"] {
            assert!(parse_bool_or_default(Some(truthy.to_string()), false));
        }
        assert!(!parse_bool_or_default(Some("off".to_string()), true));
        assert!(parse_bool_or_default(None, true));
    }
}

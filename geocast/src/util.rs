//! Small shared utilities: lazy regex compilation, run identifiers,
//! timestamps.

use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Compiles a built-in pattern once, caching it in the given cell.
///
/// Patterns are string literals written in this crate; a failure to compile
/// is a programming error.
pub(crate) fn static_regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!("invalid built-in pattern {pattern:?}: {err}"),
    })
}

/// Generates a random run identifier.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Returns the current time as an RFC3339 timestamp.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id_is_v4() {
        let id = generate_run_id();
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.contains(':'));
    }

    #[test]
    fn test_static_regex_caches() {
        static RE: OnceLock<Regex> = OnceLock::new();
        let first = static_regex(&RE, r"\d+") as *const Regex;
        let second = static_regex(&RE, r"\d+") as *const Regex;
        assert_eq!(first, second);
    }
}

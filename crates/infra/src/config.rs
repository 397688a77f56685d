//! Engine configuration.

use std::str::FromStr;

/// Tunables for the search and reservation engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Compare-and-swap attempts per reservation before surfacing `Conflict`.
    pub reservation_max_attempts: u32,
    /// Maximum medicines returned by one search.
    pub search_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reservation_max_attempts: 3,
            search_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Read `MEDFIND_RESERVE_MAX_ATTEMPTS` and `MEDFIND_SEARCH_LIMIT`.
    ///
    /// Missing or unparseable values keep the default; zero is raised to one.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            reservation_max_attempts: parse_or(
                lookup("MEDFIND_RESERVE_MAX_ATTEMPTS"),
                defaults.reservation_max_attempts,
            ),
            search_limit: parse_or(lookup("MEDFIND_SEARCH_LIMIT"), defaults.search_limit),
        }
        .normalized()
    }

    pub fn with_reservation_max_attempts(mut self, attempts: u32) -> Self {
        self.reservation_max_attempts = attempts;
        self.normalized()
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self.normalized()
    }

    fn normalized(self) -> Self {
        Self {
            reservation_max_attempts: self.reservation_max_attempts.max(1),
            search_limit: self.search_limit.max(1),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(value = %value, "ignoring unparseable engine setting");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
    }

    #[test]
    fn values_are_read_and_clamped() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("MEDFIND_RESERVE_MAX_ATTEMPTS", "0"),
            ("MEDFIND_SEARCH_LIMIT", " 25 "),
        ]));
        assert_eq!(cfg.reservation_max_attempts, 1);
        assert_eq!(cfg.search_limit, 25);
    }

    #[test]
    fn garbage_keeps_the_default() {
        let cfg = EngineConfig::from_lookup(lookup(&[("MEDFIND_SEARCH_LIMIT", "lots")]));
        assert_eq!(cfg.search_limit, 10);
    }
}

//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// The store DSN: `DATABASE_URL`, defaulting to a local sqlite file.
pub fn db_url() -> String {
    env_opt("DATABASE_URL").unwrap_or_else(|| "sqlite://mysticdeals.db".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("MYSTICDEALS_TEST_PARSE", "not-a-number");
        assert_eq!(env_parse("MYSTICDEALS_TEST_PARSE", 7u64), 7);
        std::env::remove_var("MYSTICDEALS_TEST_PARSE");
        assert_eq!(env_parse("MYSTICDEALS_TEST_PARSE", 7u64), 7);
    }

    #[test]
    fn env_opt_treats_blank_as_unset() {
        std::env::set_var("MYSTICDEALS_TEST_OPT", "   ");
        assert_eq!(env_opt("MYSTICDEALS_TEST_OPT"), None);
        std::env::set_var("MYSTICDEALS_TEST_OPT", "value");
        assert_eq!(env_opt("MYSTICDEALS_TEST_OPT").as_deref(), Some("value"));
        std::env::remove_var("MYSTICDEALS_TEST_OPT");
    }
}

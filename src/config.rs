//! Environment lookups shared by startup, the pool and the LLM client.

use std::str::FromStr;

/// Parse `key` as `T`. Unset, blank or unparseable values fall back to `default`.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

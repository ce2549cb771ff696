// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config sources merged with figment.
//!
//! Files are read from `/etc/courier`, the user config dir and the working
//! directory, in that order, and `COURIER_*` variables win over all of them.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CourierConfig;

/// Top-level sections, longest first so `circuit_breaker_*` is matched whole.
const SECTIONS: &[&str] = &[
    "circuit_breaker",
    "scheduler",
    "webhook",
    "storage",
    "logging",
    "server",
    "cache",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/courier/courier.toml` (system-wide)
/// 3. `~/.config/courier/courier.toml` (user XDG config)
/// 4. `./courier.toml` (local directory)
/// 5. `COURIER_*` environment variables
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file("/etc/courier/courier.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("courier/courier.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("courier.toml"))
        .merge(env_provider())
}

/// Maps a prefix-stripped env key onto its dotted config path.
///
/// figment passes the key in its original case, so it is lowercased first.
///
/// Uses an explicit section table rather than `Env::split("_")` because
/// both section and field names contain underscores:
/// `COURIER_CIRCUIT_BREAKER_TIMEOUT_SECS` must become
/// `circuit_breaker.timeout_secs`.
pub fn env_key_to_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(field) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    key
}

fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| env_key_to_path(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(env_key_to_path("server_port"), "server.port");
        assert_eq!(
            env_key_to_path("circuit_breaker_timeout_secs"),
            "circuit_breaker.timeout_secs"
        );
        assert_eq!(env_key_to_path("webhook_auth_key"), "webhook.auth_key");
        assert_eq!(env_key_to_path("cache_ttl_secs"), "cache.ttl_secs");
        assert_eq!(env_key_to_path("scheduler_auto_start"), "scheduler.auto_start");
    }

    #[test]
    fn uppercase_env_keys_are_mapped() {
        assert_eq!(
            env_key_to_path("CIRCUIT_BREAKER_TIMEOUT_SECS"),
            "circuit_breaker.timeout_secs"
        );
        assert_eq!(env_key_to_path("Scheduler_Batch_Size"), "scheduler.batch_size");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(env_key_to_path("bogus"), "bogus");
    }
}

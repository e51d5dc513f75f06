//! Worker configuration
//!
//! Replaces the teacher's scattered `OnceLock` statics and bare
//! `std::env::var` reads with one value built at startup and passed by
//! reference into every grader, compiler and storage client that needs it.

use std::path::PathBuf;

/// Everything a worker needs that would otherwise live in global state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the `testlib.h` header used to compile checkers/validators.
    pub testlib_path: PathBuf,
    /// Local directory compiled checker/validator binaries are cached under.
    pub compile_cache_dir: PathBuf,
    /// Compile-time limit for user submissions, inside the sandbox.
    pub compile_time_limit_ms: u32,
    /// Compile-memory limit for user submissions, inside the sandbox.
    pub compile_memory_limit_mb: u32,
    /// Default timeout for trusted (non-sandboxed) checker/validator runs.
    pub trusted_timeout_secs: u64,
    /// How often the result dispatcher flushes queued verdicts.
    pub dispatch_interval_ms: u64,
    /// Whether `cms`/`testlib` partial-credit points are clamped into
    /// `[0, point_value]` before being reported (see DESIGN.md, Open
    /// Question: themis partial-credit clamping).
    pub clamp_partial_credit: bool,
}

impl Config {
    /// Build configuration from environment variables, matching the env
    /// var names the teacher's `dotenvy`-based startup already uses.
    pub fn from_env() -> Self {
        Self {
            testlib_path: std::env::var("TESTLIB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/usr/share/testlib/testlib.h")),
            compile_cache_dir: std::env::var("COMPILE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/cache/judge/checkers")),
            compile_time_limit_ms: std::env::var("COMPILE_TIME_LIMIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            compile_memory_limit_mb: std::env::var("COMPILE_MEMORY_LIMIT_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2048),
            trusted_timeout_secs: std::env::var("TRUSTED_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            dispatch_interval_ms: std::env::var("DISPATCH_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(250),
            clamp_partial_credit: std::env::var("CLAMP_PARTIAL_CREDIT")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            testlib_path: PathBuf::from("/usr/share/testlib/testlib.h"),
            compile_cache_dir: PathBuf::from("/var/cache/judge/checkers"),
            compile_time_limit_ms: 30_000,
            compile_memory_limit_mb: 2048,
            trusted_timeout_secs: 30,
            dispatch_interval_ms: 250,
            clamp_partial_credit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_limits() {
        let config = Config::default();
        assert_eq!(config.dispatch_interval_ms, 250);
        assert!(!config.clamp_partial_credit);
    }
}

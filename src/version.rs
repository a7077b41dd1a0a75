//! What `cpu-loadgen version` reports: the build, and the load this binary
//! generates when nothing overrides the defaults.
//!
//! Build metadata is embedded by `build.rs`. Defaults are read from
//! `LoadgenConfig::default()` so the report can't drift from the config.

use std::fmt;

use crate::config::{FibMode, LoadgenConfig};

/// Build metadata embedded at compile time
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Short commit hash, or "unknown" outside a git checkout
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    git_dirty: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

/// The build this binary came from
pub const BUILD: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("LOADGEN_GIT_HASH"),
    git_branch: env!("LOADGEN_GIT_BRANCH"),
    git_dirty: env!("LOADGEN_GIT_DIRTY"),
    built_at: env!("LOADGEN_BUILD_TIMESTAMP"),
    target: env!("LOADGEN_TARGET"),
    profile: env!("LOADGEN_PROFILE"),
    rustc: env!("LOADGEN_RUSTC_VERSION"),
};

impl BuildInfo {
    pub fn dirty(&self) -> bool {
        self.git_dirty == "true"
    }

    /// e.g. "0.1.0-abc12345", with "-dirty" for uncommitted builds
    pub fn full_version(&self) -> String {
        let suffix = if self.dirty() { "-dirty" } else { "" };
        format!("{}-{}{}", self.version, self.git_hash, suffix)
    }
}

/// Build info plus the default load profile, as printed by `version`
pub struct VersionReport {
    build: BuildInfo,
    defaults: LoadgenConfig,
    cpu_count: usize,
}

impl VersionReport {
    pub fn current() -> Self {
        Self {
            build: BUILD,
            defaults: LoadgenConfig::default(),
            cpu_count: num_cpus::get(),
        }
    }

    /// Workers a request without `?workers=` gets on this host
    fn default_workers(&self, cap: usize) -> usize {
        self.cpu_count.clamp(1, cap.max(1))
    }
}

impl fmt::Display for VersionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.build;
        let load = &self.defaults.load;
        let server = &self.defaults.server;

        writeln!(f, "cpu-loadgen {} ({}, {})", b.full_version(), b.profile, b.target)?;
        writeln!(f, "  commit:  {} on {}", b.git_hash, b.git_branch)?;
        writeln!(f, "  built:   {}", b.built_at)?;
        writeln!(f, "  rustc:   {}", b.rustc)?;
        writeln!(f)?;

        writeln!(f, "Load defaults (override with a config file or LOADGEN_*):")?;
        writeln!(f, "  listen:  {}:{}", server.host, server.port)?;
        writeln!(
            f,
            "  /heavy:  {}s (max {}s), {} of max {} workers",
            load.default_duration_secs,
            load.max_duration_secs,
            self.default_workers(load.max_heavy_workers),
            load.max_heavy_workers
        )?;
        match load.fib_mode {
            FibMode::Duration => writeln!(
                f,
                "  /fib:    duration mode, {} of max {} workers, batches of {}",
                self.default_workers(load.max_fib_workers),
                load.max_fib_workers,
                load.fib_batch_size
            )?,
            FibMode::Bounded => {
                writeln!(f, "  /fib:    bounded mode, targets up to {}", load.max_fib_target)?
            }
        }
        match server.max_concurrent_loads {
            0 => writeln!(f, "  limiter: unlimited concurrent loads")?,
            n => writeln!(f, "  limiter: {} concurrent loads", n)?,
        }
        writeln!(f, "  CPUs:    {}", self.cpu_count)
    }
}

/// Print the version report to stdout
pub fn print_version() {
    print!("{}", VersionReport::current());
}

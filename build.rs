//! Build script for cpu-loadgen
//!
//! Embeds git and toolchain details so `cpu-loadgen version` can report
//! exactly which build is running inside a cluster.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = command_stdout("git", &["rev-parse", "--short=8", "HEAD"]);
    let git_branch = command_stdout("git", &["rev-parse", "--abbrev-ref", "HEAD"]);
    let git_dirty = match Command::new("git").args(["status", "--porcelain"]).output() {
        Ok(output) if output.status.success() => (!output.stdout.is_empty()).to_string(),
        _ => "unknown".to_string(),
    };
    let rustc_version = command_stdout("rustc", &["--version"]);

    let vars = [
        ("LOADGEN_GIT_HASH", git_hash),
        ("LOADGEN_GIT_BRANCH", git_branch),
        ("LOADGEN_GIT_DIRTY", git_dirty),
        (
            "LOADGEN_BUILD_TIMESTAMP",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        ("LOADGEN_TARGET", cargo_env("TARGET")),
        ("LOADGEN_PROFILE", cargo_env("PROFILE")),
        ("LOADGEN_RUSTC_VERSION", rustc_version),
    ];

    for (key, value) in vars {
        println!("cargo:rustc-env={}={}", key, value);
    }
}

/// Variable set by cargo for build scripts, or "unknown"
fn cargo_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| "unknown".to_string())
}

/// Trimmed stdout of a successful command, or "unknown"
fn command_stdout(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

//! Common test utilities and fixtures

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Get the valid config fixture path
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// Get the invalid config fixture path
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// A command for the cpu-loadgen binary
pub fn loadgen_cmd() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("cpu-loadgen").unwrap()
}

/// Ask the OS for a port that is free right now
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("Failed to find a free port")
}

/// `cpu-loadgen serve` running in the background; killed on drop
pub struct ServerProcess {
    child: Child,
    pub base_url: String,
}

impl ServerProcess {
    /// Start the server with the valid fixture plus extra `LOADGEN_*` env vars
    pub fn start(envs: &[(&str, &str)]) -> Self {
        let port = free_port();
        let child = Command::new(assert_cmd::cargo::cargo_bin("cpu-loadgen"))
            .arg("serve")
            .arg("--config")
            .arg(valid_config_fixture())
            .arg("--port")
            .arg(port.to_string())
            .envs(envs.iter().copied())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to start cpu-loadgen serve");

        let server = Self {
            child,
            base_url: format!("http://127.0.0.1:{}", port),
        };
        server.wait_until_listening(port);
        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn wait_until_listening(&self, port: u16) {
        let deadline = Instant::now() + Duration::from_secs(15);
        while Instant::now() < deadline {
            if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        panic!("cpu-loadgen did not start listening on port {}", port);
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_exist() {
        assert!(valid_config_fixture().exists(), "Valid config fixture should exist");
        assert!(invalid_config_fixture().exists(), "Invalid config fixture should exist");
    }
}

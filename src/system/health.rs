//! System information and health reporting
//!
//! `SystemInfo` is collected once at startup; CPU count drives the default
//! worker count for every load endpoint.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// System Info
// ─────────────────────────────────────────────────────────────────

/// System information collected at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Number of logical CPUs
    pub cpu_count: usize,

    /// Operating system name
    pub os_name: String,

    /// CPU architecture
    pub arch: String,

    /// Hostname (the pod name under Kubernetes)
    pub hostname: String,
}

impl SystemInfo {
    /// Collect system information
    pub fn collect() -> Self {
        Self {
            cpu_count: num_cpus::get(),
            os_name: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: get_hostname(),
        }
    }
}

/// Get hostname
fn get_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

// ─────────────────────────────────────────────────────────────────
// Health Report
// ─────────────────────────────────────────────────────────────────

/// Body of the `/health` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always "healthy" while the process can answer
    pub status: String,

    /// RFC 3339 timestamp of the check
    pub timestamp: String,
}

impl HealthReport {
    /// Report taken at the current instant
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Report for a given instant
    pub fn at(when: DateTime<Utc>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: when.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(info.cpu_count > 0);
        assert!(!info.os_name.is_empty());
        assert!(!info.hostname.is_empty());
    }

    #[test]
    fn test_health_report_timestamp_is_rfc3339() {
        let before = Utc::now();
        let report = HealthReport::now();

        assert_eq!(report.status, "healthy");
        let parsed = DateTime::parse_from_rfc3339(&report.timestamp).unwrap();
        let drift = parsed.with_timezone(&Utc) - before;
        assert!(drift.num_seconds().abs() <= 2);
    }

    #[test]
    fn test_health_report_format() {
        let when = DateTime::parse_from_rfc3339("2024-03-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(HealthReport::at(when).timestamp, "2024-03-01T12:30:45Z");
    }
}

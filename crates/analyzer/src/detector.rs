//! Brute-force detection over the materialized record table.
//!
//! For every source IP with at least one successful login, each success is
//! checked against the window of authentication events preceding it. A
//! success preceded by enough failures and at most `success_threshold`
//! successes is labeled a brute force.

use std::collections::HashSet;

use tracing::debug;

use bruteforce_core::{AnalysisError, LoginRecord};

use crate::session;
use crate::source::CancelToken;
use crate::table::RecordTable;

/// Detection thresholds.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Lookback before a success to count failures, in seconds.
    pub window_secs: i64,

    /// Minimum failures in the window to label the success a brute force.
    pub min_failed_events: usize,

    /// Maximum successes tolerated in the window. The Windows analyzer
    /// raises this to 2: one logical logon can emit duplicate 4624 rows
    /// under a single logon ID.
    pub success_threshold: usize,

    /// Session duration above which a brute-forced login is flagged as
    /// potential actor activity, in seconds.
    pub min_access_duration: i64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_secs: 3600,
            min_failed_events: 20,
            success_threshold: 1,
            min_access_duration: 300,
        }
    }
}

impl DetectorConfig {
    pub fn windows() -> Self {
        Self {
            success_threshold: 2,
            ..Self::default()
        }
    }
}

/// Brute-force logins detected for one source IP.
#[derive(Debug, Clone)]
pub struct IpDetection {
    pub source_ip: String,
    pub logins: Vec<LoginRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct BruteForceDetector {
    config: DetectorConfig,
}

impl BruteForceDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Scan every source IP and return the brute-forced logins per IP, in
    /// IP discovery order. IPs without a brute force are omitted.
    pub fn detect(
        &self,
        table: &RecordTable,
        cancel: &CancelToken,
    ) -> Result<Vec<IpDetection>, AnalysisError> {
        let mut detections = Vec::new();

        for source_ip in table.source_ips() {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let logins = self.scan_ip(table, source_ip, cancel)?;
            if logins.is_empty() {
                debug!(source_ip, "no brute force activity");
                continue;
            }

            debug!(source_ip, count = logins.len(), "brute force detected");
            detections.push(IpDetection {
                source_ip: source_ip.to_string(),
                logins,
            });
        }

        Ok(detections)
    }

    fn scan_ip(
        &self,
        table: &RecordTable,
        source_ip: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<LoginRecord>, AnalysisError> {
        let rows = table.ip_rows(source_ip);
        if !rows.iter().any(|r| r.is_success()) {
            return Ok(Vec::new());
        }

        let mut logins = Vec::new();
        let mut seen_sessions: HashSet<&str> = HashSet::new();

        // rows are timestamp-ascending; successes are visited in order
        for row in rows.iter().filter(|r| r.is_success()) {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let window_start = row.timestamp - self.config.window_secs;
            let window_end = row.timestamp;

            let mut success_count = 0usize;
            let mut failure_count = 0usize;
            for other in &rows {
                if other.timestamp < window_start || other.timestamp > window_end {
                    continue;
                }
                if other.is_success() {
                    success_count += 1;
                } else if other.is_failure() {
                    failure_count += 1;
                }
            }

            debug!(
                source_ip,
                success_count, failure_count, "window counts before success"
            );

            if success_count == 0
                || success_count > self.config.success_threshold
                || failure_count < self.config.min_failed_events
            {
                continue;
            }

            // A session may contain several success rows; emit it once.
            if !seen_sessions.insert(row.session_id.as_str()) {
                continue;
            }

            match session::login_record(
                table,
                source_ip,
                &row.domain,
                &row.username,
                &row.session_id,
            ) {
                Some(mut login) => {
                    login.source_hostname = row.source_hostname.clone();
                    logins.push(login);
                }
                None => {
                    debug!(
                        source_ip,
                        session_id = row.session_id.as_str(),
                        "no login record for brute-forced session"
                    );
                }
            }
        }

        Ok(logins)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::LoginRecord;

/// Subject of an [`AuthSummary`]: a source IP or a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    SourceIp,
    Username,
}

/// Aggregate authentication statistics for one source IP or one account.
///
/// Attached to the analyzer output as a structured attribute; the field names
/// form the stable interface to downstream reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSummary {
    pub summary_type: SummaryKind,

    /// Filled when `summary_type` is `SourceIp`.
    pub source_ip: String,

    /// Filled when `summary_type` is `Username`.
    pub domain: String,
    pub username: String,

    /// First and last time the subject appeared in any auth-related event.
    pub first_seen: i64,
    pub last_seen: i64,

    /// Chronologically first successful authentication, if any.
    pub first_auth: Option<LoginRecord>,

    /// Brute-forced logins, in chronological order. Subset of
    /// `successful_logins`.
    pub brute_forces: Vec<LoginRecord>,

    /// Every successful login for the subject, in chronological order.
    pub successful_logins: Vec<LoginRecord>,

    /// Deduplicated, sorted IPs and usernames seen in successful logins.
    pub success_source_ip_list: Vec<String>,
    pub success_username_list: Vec<String>,

    pub total_success_events: u64,
    pub total_failed_events: u64,

    pub distinct_source_ip_count: u64,
    pub distinct_username_count: u64,

    /// Top 10 source IPs / usernames by distinct event timestamps, ties
    /// resolved by key order.
    pub top_source_ips: BTreeMap<String, u64>,
    pub top_usernames: BTreeMap<String, u64>,
}

impl AuthSummary {
    pub fn for_ip(source_ip: &str) -> Self {
        Self::empty(SummaryKind::SourceIp, source_ip, "", "")
    }

    pub fn for_user(domain: &str, username: &str) -> Self {
        Self::empty(SummaryKind::Username, "", domain, username)
    }

    fn empty(summary_type: SummaryKind, source_ip: &str, domain: &str, username: &str) -> Self {
        Self {
            summary_type,
            source_ip: source_ip.to_string(),
            domain: domain.to_string(),
            username: username.to_string(),
            first_seen: 0,
            last_seen: 0,
            first_auth: None,
            brute_forces: Vec::new(),
            successful_logins: Vec::new(),
            success_source_ip_list: Vec::new(),
            success_username_list: Vec::new(),
            total_success_events: 0,
            total_failed_events: 0,
            distinct_source_ip_count: 0,
            distinct_username_count: 0,
            top_source_ips: BTreeMap::new(),
            top_usernames: BTreeMap::new(),
        }
    }
}

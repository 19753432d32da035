//! Aggregate statistics per source IP and per user account.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use bruteforce_core::{AuthRecord, AuthSummary, LoginRecord};

use crate::session;
use crate::table::RecordTable;

/// Number of entries kept in the top-IP / top-username maps.
const TOP_N: usize = 10;

pub struct SummaryBuilder<'a> {
    table: &'a RecordTable,
}

impl<'a> SummaryBuilder<'a> {
    pub fn new(table: &'a RecordTable) -> Self {
        Self { table }
    }

    /// Authentication summary for a source IP, or None when the table has
    /// no rows for it.
    pub fn ip_summary(&self, source_ip: &str) -> Option<AuthSummary> {
        let rows = self.table.ip_rows(source_ip);
        if rows.is_empty() {
            debug!(source_ip, "no rows for source ip");
            return None;
        }

        let mut summary = AuthSummary::for_ip(source_ip);
        self.fill(&mut summary, &rows);
        Some(summary)
    }

    /// Authentication summary for a (domain, username) account, or None
    /// when the table has no rows for it.
    pub fn user_summary(&self, domain: &str, username: &str) -> Option<AuthSummary> {
        let rows = self.table.user_rows(domain, username);
        if rows.is_empty() {
            debug!(domain, username, "no rows for user account");
            return None;
        }

        let mut summary = AuthSummary::for_user(domain, username);
        self.fill(&mut summary, &rows);
        Some(summary)
    }

    fn fill(&self, summary: &mut AuthSummary, rows: &[&AuthRecord]) {
        // rows are timestamp-ascending
        summary.first_seen = rows.first().map(|r| r.timestamp).unwrap_or(0);
        summary.last_seen = rows.last().map(|r| r.timestamp).unwrap_or(0);

        for row in rows.iter().filter(|r| r.is_success()) {
            let mut login = LoginRecord::new(
                &row.source_ip,
                &row.session_id,
                &row.username,
                &row.domain,
            );
            login.timestamp = row.timestamp;
            login.source_port = row.source_port;
            login.source_hostname = row.source_hostname.clone();
            login.session_duration =
                session::session_duration(self.table, &row.session_id, row.timestamp);
            summary.successful_logins.push(login);
        }
        summary.first_auth = summary.successful_logins.first().cloned();

        let success_ips: BTreeSet<&str> = rows
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.source_ip.as_str())
            .collect();
        let success_users: BTreeSet<&str> = rows
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.username.as_str())
            .collect();
        summary.success_source_ip_list = success_ips.into_iter().map(String::from).collect();
        summary.success_username_list = success_users.into_iter().map(String::from).collect();

        summary.total_success_events = rows.iter().filter(|r| r.is_success()).count() as u64;
        summary.total_failed_events = rows.iter().filter(|r| r.is_failure()).count() as u64;

        let distinct_ips: BTreeSet<&str> = rows.iter().map(|r| r.source_ip.as_str()).collect();
        let distinct_users: BTreeSet<&str> = rows.iter().map(|r| r.username.as_str()).collect();
        summary.distinct_source_ip_count = distinct_ips.len() as u64;
        summary.distinct_username_count = distinct_users.len() as u64;

        summary.top_source_ips = top_counts(rows, |r| r.source_ip.as_str());
        summary.top_usernames = top_counts(rows, |r| r.username.as_str());
    }
}

/// Top-N values by distinct event timestamps among authentication rows.
///
/// Selection keeps the N largest counts; ties prefer the lexicographically
/// smaller key. Disconnections are excluded so the counts stay bounded by
/// the subject's success + failure totals.
fn top_counts<'r>(
    rows: &[&'r AuthRecord],
    key: impl Fn(&'r AuthRecord) -> &'r str,
) -> BTreeMap<String, u64> {
    let mut timestamps: BTreeMap<&str, BTreeSet<i64>> = BTreeMap::new();
    for row in rows.iter().copied().filter(|r| r.auth_result.is_some()) {
        timestamps.entry(key(row)).or_default().insert(row.timestamp);
    }

    let mut counted: Vec<(&str, u64)> = timestamps
        .into_iter()
        .map(|(value, ts)| (value, ts.len() as u64))
        .collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counted.truncate(TOP_N);

    counted
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}

/// Join domain and username into the `domain\username` account form.
pub fn to_useraccount(domain: &str, username: &str) -> String {
    if domain.is_empty() {
        return username.to_string();
    }
    format!("{domain}\\{username}")
}

/// Split a `domain\username` account back into its parts.
pub fn from_useraccount(useraccount: &str) -> (String, String) {
    match useraccount.split_once('\\') {
        Some((domain, username)) => (domain.trim().to_string(), username.trim().to_string()),
        None => (String::new(), useraccount.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bruteforce_core::{AuthMethod, AuthResult, EventType, SummaryKind, UNKNOWN_DURATION};

    fn auth(
        event_id: &str,
        timestamp: i64,
        source_ip: &str,
        username: &str,
        session_id: &str,
        result: AuthResult,
    ) -> AuthRecord {
        AuthRecord {
            event_id: event_id.to_string(),
            timestamp,
            hostname: "host1".to_string(),
            event_type: EventType::Authentication,
            auth_method: AuthMethod::Password,
            auth_result: Some(result),
            source_ip: source_ip.to_string(),
            source_port: 50000,
            source_hostname: String::new(),
            domain: String::new(),
            username: username.to_string(),
            session_id: session_id.to_string(),
        }
    }

    fn sample_table() -> RecordTable {
        let mut records = vec![
            auth("evt_1", 1000, "10.0.0.1", "root", "f1", AuthResult::Failure),
            auth("evt_2", 1100, "10.0.0.1", "admin", "f2", AuthResult::Failure),
            auth("evt_3", 1200, "10.0.0.1", "root", "s1", AuthResult::Success),
            auth("evt_4", 1300, "10.0.0.1", "root", "s2", AuthResult::Success),
        ];
        records.push(AuthRecord {
            event_type: EventType::Disconnection,
            auth_result: None,
            auth_method: AuthMethod::Unknown,
            ..auth("evt_5", 1500, "10.0.0.1", "root", "s1", AuthResult::Success)
        });
        RecordTable::build(records).unwrap()
    }

    #[test]
    fn test_ip_summary_statistics() {
        let table = sample_table();
        let summary = SummaryBuilder::new(&table).ip_summary("10.0.0.1").unwrap();

        assert_eq!(summary.summary_type, SummaryKind::SourceIp);
        assert_eq!(summary.first_seen, 1000);
        assert_eq!(summary.last_seen, 1500);
        assert_eq!(summary.total_success_events, 2);
        assert_eq!(summary.total_failed_events, 2);
        assert_eq!(summary.distinct_username_count, 2);
        assert_eq!(summary.success_username_list, vec!["root".to_string()]);

        let first_auth = summary.first_auth.as_ref().unwrap();
        assert_eq!(first_auth.timestamp, 1200);
        assert_eq!(first_auth.session_duration, 300);

        assert_eq!(summary.successful_logins.len(), 2);
        assert_eq!(
            summary.successful_logins[1].session_duration,
            UNKNOWN_DURATION
        );
    }

    #[test]
    fn test_user_summary_filters_account() {
        let table = sample_table();
        let builder = SummaryBuilder::new(&table);

        let summary = builder.user_summary("", "admin").unwrap();
        assert_eq!(summary.summary_type, SummaryKind::Username);
        assert_eq!(summary.total_failed_events, 1);
        assert_eq!(summary.total_success_events, 0);
        assert!(summary.first_auth.is_none());

        assert!(builder.user_summary("CORP", "admin").is_none());
    }

    #[test]
    fn test_top_counts_capped_with_lexicographic_ties() {
        let mut records = Vec::new();
        // 12 usernames, one failure each at distinct timestamps; user_00
        // gets a second timestamp so it must rank first
        for i in 0..12 {
            records.push(auth(
                &format!("evt_{i}"),
                1000 + i as i64,
                "10.0.0.1",
                &format!("user_{i:02}"),
                &format!("f{i}"),
                AuthResult::Failure,
            ));
        }
        records.push(auth(
            "evt_extra",
            2000,
            "10.0.0.1",
            "user_00",
            "f_extra",
            AuthResult::Failure,
        ));

        let table = RecordTable::build(records).unwrap();
        let summary = SummaryBuilder::new(&table).ip_summary("10.0.0.1").unwrap();

        assert_eq!(summary.top_usernames.len(), 10);
        assert_eq!(summary.top_usernames.get("user_00"), Some(&2));
        // ties at count 1 resolve to the lexicographically smallest keys
        assert!(summary.top_usernames.contains_key("user_01"));
        assert!(!summary.top_usernames.contains_key("user_11"));

        let total: u64 = summary.top_usernames.values().sum();
        assert!(total <= summary.total_success_events + summary.total_failed_events);
    }

    #[test]
    fn test_useraccount_round_trip() {
        assert_eq!(to_useraccount("CORP", "admin"), "CORP\\admin");
        assert_eq!(to_useraccount("", "root"), "root");
        assert_eq!(
            from_useraccount("CORP\\admin"),
            ("CORP".to_string(), "admin".to_string())
        );
        assert_eq!(
            from_useraccount("root"),
            (String::new(), "root".to_string())
        );
    }
}

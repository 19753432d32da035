//! Materialized view over the normalized record set.
//!
//! The record stream is collected into a timestamp-sorted vector with a
//! per-source-IP index, which is what the window scan in the detector and
//! the summary builder operate on. Construction validates the schema
//! invariants; a violation is fatal for the invocation.

use std::collections::HashMap;

use bruteforce_core::{AnalysisError, AuthRecord};

#[derive(Debug, Default)]
pub struct RecordTable {
    /// Sorted by (timestamp, event_id) ascending.
    records: Vec<AuthRecord>,

    /// Row positions per source IP.
    by_ip: HashMap<String, Vec<usize>>,

    /// Source IPs in first-appearance order after sorting. Reports are
    /// emitted in this order.
    ip_order: Vec<String>,
}

impl RecordTable {
    /// Build the table from normalized records.
    ///
    /// Fails fast with `SchemaMismatch` when any record violates the
    /// invariants (timestamp present, authentication carries a result).
    pub fn build(mut records: Vec<AuthRecord>) -> Result<Self, AnalysisError> {
        for record in &records {
            record.validate().map_err(AnalysisError::SchemaMismatch)?;
        }

        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });

        let mut by_ip: HashMap<String, Vec<usize>> = HashMap::new();
        let mut ip_order = Vec::new();
        for (row, record) in records.iter().enumerate() {
            if record.source_ip.is_empty() {
                continue;
            }
            let rows = by_ip.entry(record.source_ip.clone()).or_default();
            if rows.is_empty() {
                ip_order.push(record.source_ip.clone());
            }
            rows.push(row);
        }

        Ok(Self {
            records,
            by_ip,
            ip_order,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[AuthRecord] {
        &self.records
    }

    /// Source IPs in discovery order.
    pub fn source_ips(&self) -> impl Iterator<Item = &str> {
        self.ip_order.iter().map(|ip| ip.as_str())
    }

    /// All rows for a source IP, in timestamp order.
    pub fn ip_rows(&self, source_ip: &str) -> Vec<&AuthRecord> {
        self.by_ip
            .get(source_ip)
            .map(|rows| rows.iter().map(|&row| &self.records[row]).collect())
            .unwrap_or_default()
    }

    /// All rows for a user account, in timestamp order.
    pub fn user_rows(&self, domain: &str, username: &str) -> Vec<&AuthRecord> {
        self.records
            .iter()
            .filter(|r| r.domain == domain && r.username == username)
            .collect()
    }

    /// Rows matching the full session key, in timestamp order.
    pub fn session_rows(
        &self,
        source_ip: &str,
        domain: &str,
        username: &str,
        session_id: &str,
    ) -> Vec<&AuthRecord> {
        self.ip_rows(source_ip)
            .into_iter()
            .filter(|r| {
                r.domain == domain && r.username == username && r.session_id == session_id
            })
            .collect()
    }

    /// Rows sharing a session ID regardless of the rest of the key, in
    /// timestamp order. Used to collect event IDs for annotation.
    pub fn rows_with_session_id(&self, session_id: &str) -> Vec<&AuthRecord> {
        self.records
            .iter()
            .filter(|r| r.session_id == session_id)
            .collect()
    }
}

//! SSH syslog normalizer.
//!
//! Recognizes exactly three sshd message families by leading keyword:
//! `Accepted`, `Failed`, and `Disconnected`. Pre-authentication disconnects
//! (`[preauth]`) carry no usable session information and are dropped.

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use bruteforce_core::{AuthMethod, AuthRecord, AuthResult, EventType};

use super::ParseOutcome;
use crate::source::RawEvent;

// `Accepted password for root from 172.16.51.224 port 50224 ssh2`
static ACCEPTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Accepted (password|publickey) for (\S+) from (\S+) port (\d+)").unwrap()
});

// `Failed password for invalid user admin from 172.16.51.224 port 50101 ssh2`
static FAILED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Failed (password|publickey) for (?:invalid user )?(\S+) from (\S+) port (\d+)")
        .unwrap()
});

// `Disconnected from user root 172.16.51.224 port 50224`
static DISCONNECTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Disconnected from (?:invalid user |authenticating user |user )?(\S+) (\S+) port (\d+)")
        .unwrap()
});

/// Deterministic pseudo-session ID for SSH events.
///
/// SHA-256 over `date|hostname|username|source_ip|source_port`, with `date`
/// the UTC calendar date of the event. Clusters one attempt chain from a
/// given (ip, port) pair on a given day; same-day collisions between two
/// distinct sessions sharing all fields are accepted.
pub fn pseudo_session_id(
    date: &str,
    hostname: &str,
    username: &str,
    source_ip: &str,
    source_port: u16,
) -> String {
    let hash_data = format!("{date}|{hostname}|{username}|{source_ip}|{source_port}");

    let mut hasher = Sha256::new();
    hasher.update(hash_data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Normalize one sshd syslog event.
pub fn normalize(event: &RawEvent) -> ParseOutcome {
    let body = match event.str_field("body") {
        Some(body) if !body.is_empty() => body,
        _ => return ParseOutcome::Malformed(format!("event {}: body is empty", event.event_id)),
    };

    let timestamp = event.timestamp_secs();
    if timestamp <= 0 {
        return ParseOutcome::Malformed(format!("event {}: missing timestamp", event.event_id));
    }

    let hostname = event.str_field("hostname").unwrap_or_default();

    let (event_type, auth_method, auth_result, username, source_ip, source_port) =
        if body.starts_with("Accepted") || body.starts_with("Failed") {
            let (regex, result) = if body.starts_with("Accepted") {
                (&*ACCEPTED_RE, AuthResult::Success)
            } else {
                (&*FAILED_RE, AuthResult::Failure)
            };

            let caps = match regex.captures(body) {
                Some(caps) => caps,
                None => {
                    return ParseOutcome::Malformed(format!(
                        "event {}: unparseable sshd message: {}",
                        event.event_id, body
                    ))
                }
            };

            let method = match &caps[1] {
                "password" => AuthMethod::Password,
                "publickey" => AuthMethod::Publickey,
                _ => AuthMethod::Unknown,
            };
            let port = caps[4].parse().unwrap_or(0);

            (
                EventType::Authentication,
                method,
                Some(result),
                caps[2].to_string(),
                caps[3].to_string(),
                port,
            )
        } else if body.starts_with("Disconnected") {
            if body.contains("[preauth]") {
                return ParseOutcome::Skipped("pre-authentication disconnect");
            }

            let caps = match DISCONNECTED_RE.captures(body) {
                Some(caps) => caps,
                None => {
                    return ParseOutcome::Malformed(format!(
                        "event {}: unparseable disconnect message: {}",
                        event.event_id, body
                    ))
                }
            };
            let port = caps[3].parse().unwrap_or(0);

            (
                EventType::Disconnection,
                AuthMethod::Unknown,
                None,
                caps[1].to_string(),
                caps[2].to_string(),
                port,
            )
        } else {
            return ParseOutcome::Skipped("unrecognized sshd message family");
        };

    let date = match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => {
            return ParseOutcome::Malformed(format!(
                "event {}: timestamp {} out of range",
                event.event_id, timestamp
            ))
        }
    };

    let session_id = pseudo_session_id(&date, hostname, &username, &source_ip, source_port);

    ParseOutcome::Parsed(AuthRecord {
        event_id: event.event_id.clone(),
        timestamp,
        hostname: hostname.to_string(),
        event_type,
        auth_method,
        auth_result,
        source_ip,
        source_port,
        source_hostname: String::new(),
        domain: String::new(),
        username,
        session_id,
    })
}

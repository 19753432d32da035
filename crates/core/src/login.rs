use serde::{Deserialize, Serialize};

/// Sentinel duration for a session with no observed disconnection.
pub const UNKNOWN_DURATION: i64 = -1;

/// A single successful login, possibly brute-forced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRecord {
    /// Timestamp of the successful authentication, Unix seconds.
    pub timestamp: i64,

    /// Session ID or pseudo-session ID of the login.
    pub session_id: String,

    /// Session length in seconds, or [`UNKNOWN_DURATION`] when no matching
    /// disconnection was observed.
    pub session_duration: i64,

    pub source_ip: String,
    pub source_port: u16,

    /// Client hostname. Only relevant for Windows.
    pub source_hostname: String,

    /// Only used for Windows authentication.
    pub domain: String,

    pub username: String,
}

impl LoginRecord {
    pub fn new(source_ip: &str, session_id: &str, username: &str, domain: &str) -> Self {
        Self {
            timestamp: 0,
            session_id: session_id.to_string(),
            session_duration: UNKNOWN_DURATION,
            source_ip: source_ip.to_string(),
            source_port: 0,
            source_hostname: String::new(),
            domain: domain.to_string(),
            username: username.to_string(),
        }
    }

    /// Whether a disconnection was observed for this login.
    pub fn has_known_duration(&self) -> bool {
        self.session_duration >= 0
    }
}

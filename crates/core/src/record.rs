use serde::{Deserialize, Serialize};

/// Kind of event a normalized record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Authentication,
    Disconnection,
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Authentication => "authentication",
            EventType::Disconnection => "disconnection",
        }
    }
}

/// Authentication method observed in the source event.
///
/// Windows security events do not record the method; those records carry
/// `Password` by convention. Disconnections carry `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Password,
    Publickey,
    Unknown,
}

impl AuthMethod {
    pub fn as_str(&self) -> &str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::Publickey => "publickey",
            AuthMethod::Unknown => "unknown",
        }
    }
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuthResult {
    Success,
    Failure,
}

impl AuthResult {
    pub fn as_str(&self) -> &str {
        match self {
            AuthResult::Success => "success",
            AuthResult::Failure => "failure",
        }
    }
}

/// One normalized authentication event.
///
/// Both the SSH and Windows normalizers produce this schema; everything
/// downstream (session tracking, detection, summaries) operates on it and
/// never on the raw source fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthRecord {
    /// Opaque document ID from the external event store.
    pub event_id: String,

    /// Event time in Unix seconds. Ordering key for the whole pipeline.
    pub timestamp: i64,

    /// Hostname of the target system.
    pub hostname: String,

    pub event_type: EventType,
    pub auth_method: AuthMethod,

    /// None only for disconnection records.
    pub auth_result: Option<AuthResult>,

    /// Empty allowed for disconnection records.
    pub source_ip: String,

    /// 0 when the source did not carry a port.
    pub source_port: u16,

    /// Client hostname. Only populated for Windows events.
    pub source_hostname: String,

    /// Empty for non-Windows events.
    pub domain: String,

    pub username: String,

    /// Session ID from the source (Windows TargetLogonId, kept verbatim
    /// including the `0x…` form) or the derived SSH pseudo-session ID.
    pub session_id: String,
}

impl AuthRecord {
    pub fn is_success(&self) -> bool {
        self.auth_result == Some(AuthResult::Success)
    }

    pub fn is_failure(&self) -> bool {
        self.auth_result == Some(AuthResult::Failure)
    }

    pub fn is_disconnection(&self) -> bool {
        self.event_type == EventType::Disconnection
    }

    /// Validate the record invariants.
    ///
    /// Every record must carry a timestamp; an authentication record must
    /// carry a result and a disconnection must not.
    pub fn validate(&self) -> Result<(), String> {
        if self.timestamp <= 0 {
            return Err(format!("record {} has no timestamp", self.event_id));
        }

        match (self.event_type, self.auth_result) {
            (EventType::Authentication, None) => Err(format!(
                "authentication record {} has no auth_result",
                self.event_id
            )),
            (EventType::Disconnection, Some(_)) => Err(format!(
                "disconnection record {} carries an auth_result",
                self.event_id
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event_type: EventType, auth_result: Option<AuthResult>) -> AuthRecord {
        AuthRecord {
            event_id: "evt_1".to_string(),
            timestamp: 1700000000,
            hostname: "host1".to_string(),
            event_type,
            auth_method: AuthMethod::Password,
            auth_result,
            source_ip: "172.16.51.224".to_string(),
            source_port: 50224,
            source_hostname: String::new(),
            domain: String::new(),
            username: "root".to_string(),
            session_id: "s1".to_string(),
        }
    }

    #[test]
    fn test_authentication_requires_result() {
        let rec = record(EventType::Authentication, Some(AuthResult::Success));
        assert!(rec.validate().is_ok());

        let rec = record(EventType::Authentication, None);
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_disconnection_carries_no_result() {
        let rec = record(EventType::Disconnection, None);
        assert!(rec.validate().is_ok());

        let rec = record(EventType::Disconnection, Some(AuthResult::Failure));
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_zero_timestamp_rejected() {
        let mut rec = record(EventType::Authentication, Some(AuthResult::Failure));
        rec.timestamp = 0;
        assert!(rec.validate().is_err());
    }
}

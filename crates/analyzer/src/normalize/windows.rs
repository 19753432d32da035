//! Windows security event normalizer.
//!
//! Handles logon (4624), failed logon (4625), and logoff (4634) events from
//! the Security channel. Field extraction walks the `EventData` children of
//! the event XML payload by their `Name` attribute.

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;

use bruteforce_core::{AuthMethod, AuthRecord, AuthResult, EventType};

use super::ParseOutcome;
use crate::source::RawEvent;

pub const EVENT_LOGON_SUCCESS: u64 = 4624;
pub const EVENT_LOGON_FAILED: u64 = 4625;
pub const EVENT_LOGOFF: u64 = 4634;

/// Logon types in scope for brute-force analysis: local interactive,
/// network, and remote interactive (RDP). Service, batch, and cached logons
/// are discarded.
pub const BRUTE_FORCE_LOGON_TYPES: [i64; 3] = [2, 3, 10];

#[derive(Debug, Default)]
struct EventDataFields {
    username: String,
    domain: String,
    /// TargetLogonId, kept verbatim including the `0x…` form.
    logon_id: String,
    source_hostname: String,
    source_ip: String,
    source_port: u16,
    logon_type: Option<i64>,
}

impl EventDataFields {
    fn set(&mut self, name: &str, value: &str) {
        match name {
            "TargetUserName" => self.username = value.to_string(),
            "TargetDomainName" => self.domain = value.to_string(),
            "TargetLogonId" => self.logon_id = value.to_string(),
            "WorkstationName" => self.source_hostname = value.to_string(),
            "IpAddress" => self.source_ip = value.to_string(),
            "IpPort" => self.source_port = value.parse().unwrap_or(0),
            "LogonType" => self.logon_type = value.parse().ok(),
            _ => {}
        }
    }
}

/// Walk `EventData/Data` children by their `Name` attribute.
fn parse_event_data(xml_string: &str) -> Result<EventDataFields, String> {
    let mut reader = Reader::from_str(xml_string);
    reader.trim_text(true);

    let mut fields = EventDataFields::default();
    let mut in_event_data = false;
    let mut current_name: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(ref e)) => {
                if e.local_name().as_ref() == b"EventData" {
                    in_event_data = true;
                } else if in_event_data && e.local_name().as_ref() == b"Data" {
                    current_name = data_name(e);
                }
            }
            Ok(XmlEvent::Empty(ref e)) => {
                // `<Data Name="IpAddress"/>` with no text payload
                if in_event_data && e.local_name().as_ref() == b"Data" {
                    if let Some(name) = data_name(e) {
                        fields.set(&name, "");
                    }
                }
            }
            Ok(XmlEvent::Text(ref t)) => {
                if let Some(name) = current_name.as_deref() {
                    let value = t.unescape().map_err(|e| e.to_string())?;
                    fields.set(name, value.trim());
                }
            }
            Ok(XmlEvent::End(ref e)) => {
                if e.local_name().as_ref() == b"EventData" {
                    in_event_data = false;
                } else if e.local_name().as_ref() == b"Data" {
                    current_name = None;
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    Ok(fields)
}

fn data_name(e: &quick_xml::events::BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"Name")
        .and_then(|attr| attr.unescape_value().ok())
        .map(|v| v.to_string())
}

/// Normalize one Windows security event.
pub fn normalize(event: &RawEvent) -> ParseOutcome {
    let event_identifier = match event.u64_field("event_identifier") {
        Some(eid) => eid,
        None => {
            return ParseOutcome::Malformed(format!(
                "event {}: missing event_identifier",
                event.event_id
            ))
        }
    };

    let timestamp = event.timestamp_secs();
    if timestamp <= 0 {
        return ParseOutcome::Malformed(format!("event {}: missing timestamp", event.event_id));
    }

    let hostname = match event.str_field("computer_name") {
        Some(hostname) if !hostname.is_empty() => hostname,
        _ => {
            return ParseOutcome::Malformed(format!(
                "event {}: missing computer_name",
                event.event_id
            ))
        }
    };

    let xml_string = match event.str_field("xml_string") {
        Some(xml) if !xml.is_empty() => xml,
        _ => {
            return ParseOutcome::Malformed(format!(
                "event {}: missing xml_string",
                event.event_id
            ))
        }
    };

    let fields = match parse_event_data(xml_string) {
        Ok(fields) => fields,
        Err(e) => {
            return ParseOutcome::Malformed(format!(
                "event {}: unparseable xml_string: {}",
                event.event_id, e
            ))
        }
    };

    let (event_type, auth_method, auth_result) = match event_identifier {
        EVENT_LOGON_SUCCESS | EVENT_LOGON_FAILED => {
            let logon_type = fields.logon_type.unwrap_or(0);
            if !BRUTE_FORCE_LOGON_TYPES.contains(&logon_type) {
                return ParseOutcome::Skipped("out-of-scope logon type");
            }

            // The Security channel does not record the authentication
            // method; password is assumed.
            let result = if event_identifier == EVENT_LOGON_SUCCESS {
                AuthResult::Success
            } else {
                AuthResult::Failure
            };
            (EventType::Authentication, AuthMethod::Password, Some(result))
        }
        EVENT_LOGOFF => (EventType::Disconnection, AuthMethod::Unknown, None),
        _ => return ParseOutcome::Skipped("event identifier out of scope"),
    };

    ParseOutcome::Parsed(AuthRecord {
        event_id: event.event_id.clone(),
        timestamp,
        hostname: hostname.to_string(),
        event_type,
        auth_method,
        auth_result,
        source_ip: fields.source_ip,
        source_port: fields.source_port,
        source_hostname: fields.source_hostname,
        domain: fields.domain,
        username: fields.username,
        session_id: fields.logon_id,
    })
}

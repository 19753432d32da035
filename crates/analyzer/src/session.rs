//! Session tracking: pair a successful login with its disconnection.

use tracing::debug;

use bruteforce_core::{LoginRecord, UNKNOWN_DURATION};

use crate::table::RecordTable;

/// Compute the [`LoginRecord`] for the first successful authentication under
/// a session key.
///
/// The login row is matched on the full (source_ip, domain, username,
/// session_id) key; the logout is the first disconnection at or after it
/// among rows sharing the session ID alone, because Windows logoff events
/// (4634) do not carry the source address. Later successes under the same
/// key do not produce additional records.
pub fn login_record(
    table: &RecordTable,
    source_ip: &str,
    domain: &str,
    username: &str,
    session_id: &str,
) -> Option<LoginRecord> {
    let rows = table.session_rows(source_ip, domain, username, session_id);
    if rows.is_empty() {
        debug!(source_ip, session_id, "no rows for session key");
        return None;
    }

    let login_row = rows.iter().find(|r| r.is_success())?;

    let mut login = LoginRecord::new(source_ip, session_id, username, domain);
    login.timestamp = login_row.timestamp;
    login.source_port = login_row.source_port;
    login.session_duration = session_duration(table, session_id, login_row.timestamp);

    debug!(
        session_id,
        duration = login.session_duration,
        "computed login session"
    );
    Some(login)
}

/// Session duration for a login at `from_ts` within a session's rows: first
/// disconnection at or after the login, or [`UNKNOWN_DURATION`] when none
/// was observed. Out-of-order data yielding a negative span maps to the
/// sentinel as well.
fn duration_from(rows: &[&bruteforce_core::AuthRecord], from_ts: i64) -> i64 {
    let logout_ts = rows
        .iter()
        .filter(|r| r.is_disconnection() && r.timestamp >= from_ts)
        .map(|r| r.timestamp)
        .next();

    match logout_ts {
        Some(logout_ts) if logout_ts >= from_ts => logout_ts - from_ts,
        _ => UNKNOWN_DURATION,
    }
}

/// Duration for one success row of a session, used when summarizing every
/// successful login rather than only the first.
pub fn session_duration(table: &RecordTable, session_id: &str, from_ts: i64) -> i64 {
    if session_id.is_empty() || from_ts <= 0 {
        return UNKNOWN_DURATION;
    }
    let rows = table.rows_with_session_id(session_id);
    duration_from(&rows, from_ts)
}

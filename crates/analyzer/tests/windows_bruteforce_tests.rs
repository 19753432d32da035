// End-to-end scenarios for the Windows logon brute-force analyzer.

use serde_json::json;

use bruteforce_analyzer::{
    CancelToken, MemoryAnnotationSink, MemoryEventSource, MemoryFindingSink, RawEvent,
    WindowsBruteForceAnalyzer,
};
use bruteforce_core::{Priority, ResultStatus, SummaryKind};

const ATTACKER_IP: &str = "172.16.51.224";

fn logon_xml(username: &str, logon_id: &str, logon_type: i64, ip: &str, port: &str) -> String {
    format!(
        concat!(
            "<Event xmlns=\"http://schemas.microsoft.com/win/2004/08/events/event\">",
            "<System><Computer>WIN-SRV01</Computer></System>",
            "<EventData>",
            "<Data Name=\"TargetUserName\">{username}</Data>",
            "<Data Name=\"TargetDomainName\">CORP</Data>",
            "<Data Name=\"TargetLogonId\">{logon_id}</Data>",
            "<Data Name=\"LogonType\">{logon_type}</Data>",
            "<Data Name=\"WorkstationName\">ATTACKER-PC</Data>",
            "<Data Name=\"IpAddress\">{ip}</Data>",
            "<Data Name=\"IpPort\">{port}</Data>",
            "</EventData></Event>"
        ),
        username = username,
        logon_id = logon_id,
        logon_type = logon_type,
        ip = ip,
        port = port,
    )
}

fn win_event(event_id: &str, ts_secs: i64, eid: u64, xml: &str) -> RawEvent {
    RawEvent::new(event_id, ts_secs * 1_000_000)
        .with_field("computer_name", json!("WIN-SRV01"))
        .with_field("event_identifier", json!(eid))
        .with_field("xml_string", json!(xml))
}

/// 25 failed network logons, then a success under `0x3e7b21`.
fn windows_attack(base_ts: i64) -> Vec<RawEvent> {
    let mut events = Vec::new();
    for i in 0..25 {
        events.push(win_event(
            &format!("fail_{i}"),
            base_ts + i * 20,
            4625,
            &logon_xml(
                "Administrator",
                "0x0",
                3,
                ATTACKER_IP,
                &format!("{}", 49800 + i),
            ),
        ));
    }
    events.push(win_event(
        "logon_1",
        base_ts + 520,
        4624,
        &logon_xml("Administrator", "0x3e7b21", 3, ATTACKER_IP, "49999"),
    ));
    events
}

fn run_analyzer(
    events: Vec<RawEvent>,
) -> (
    bruteforce_core::AnalyzerOutput,
    MemoryAnnotationSink,
    MemoryFindingSink,
) {
    let mut source = MemoryEventSource::new(events);
    let mut annotations = MemoryAnnotationSink::new();
    let mut findings = MemoryFindingSink::new();

    let mut analyzer = WindowsBruteForceAnalyzer::new();
    let output = analyzer.run(
        &mut source,
        &mut annotations,
        &mut findings,
        &CancelToken::new(),
    );
    (output, annotations, findings)
}

#[test]
fn test_brute_force_with_actor_activity() {
    let mut events = windows_attack(1700000000);
    events.push(win_event(
        "logoff_1",
        1700000000 + 520 + 600,
        4634,
        &logon_xml("Administrator", "0x3e7b21", 3, "-", "-"),
    ));

    let (output, annotations, findings) = run_analyzer(events);

    assert_eq!(output.result_status, ResultStatus::Success);
    assert_eq!(output.result_priority, Priority::Critical);
    assert!(output.result_markdown.contains("Potential actor activity"));

    let ip_summary = &output.attributes[0];
    assert_eq!(ip_summary.source_ip, ATTACKER_IP);
    assert_eq!(ip_summary.brute_forces.len(), 1);
    let login = &ip_summary.brute_forces[0];
    assert_eq!(login.session_duration, 600);
    assert_eq!(login.domain, "CORP");
    assert_eq!(login.username, "Administrator");
    assert_eq!(login.source_hostname, "ATTACKER-PC");
    assert_eq!(login.session_id, "0x3e7b21");

    // Logon and logoff rows are labeled; the failed attempts are not
    assert_eq!(annotations.calls.len(), 1);
    let (ids, annotation) = &annotations.calls[0];
    assert_eq!(ids, &vec!["logon_1".to_string(), "logoff_1".to_string()]);
    assert_eq!(annotation.label, "windows_bruteforce");
    assert!(annotation.star);

    assert_eq!(findings.outputs.len(), 1);
}

#[test]
fn test_duplicate_success_rows_deduped_by_logon_id() {
    let mut events = windows_attack(1700000000);
    // A second 4624 for the same TargetLogonId, as the Security channel
    // tends to produce
    events.push(win_event(
        "logon_dup",
        1700000000 + 521,
        4624,
        &logon_xml("Administrator", "0x3e7b21", 3, ATTACKER_IP, "49999"),
    ));

    let (output, _, _) = run_analyzer(events);

    assert_eq!(output.result_priority, Priority::High);
    assert_eq!(
        output.result_summary,
        format!("1 brute force from {ATTACKER_IP}")
    );
    assert_eq!(output.attributes[0].brute_forces.len(), 1);
}

#[test]
fn test_out_of_scope_logon_types_discarded() {
    let mut events = Vec::new();
    for i in 0..25 {
        // Service logons are not brute-force material
        events.push(win_event(
            &format!("svc_fail_{i}"),
            1700000000 + i,
            4625,
            &logon_xml("svc_backup", "0x0", 5, ATTACKER_IP, "49800"),
        ));
    }
    events.push(win_event(
        "logon_1",
        1700000100,
        4624,
        &logon_xml("Administrator", "0x3e7b21", 3, ATTACKER_IP, "49999"),
    ));

    let (output, _, _) = run_analyzer(events);

    // The 25 failures were all filtered out, so no brute force remains
    assert_eq!(output.result_priority, Priority::Low);
    assert_eq!(output.result_summary, "No brute force activity");
}

#[test]
fn test_domain_account_summary() {
    let (output, _, _) = run_analyzer(windows_attack(1700000000));

    let user_summary = output
        .attributes
        .iter()
        .find(|s| s.summary_type == SummaryKind::Username)
        .expect("account summary present");
    assert_eq!(user_summary.domain, "CORP");
    assert_eq!(user_summary.username, "Administrator");
    assert_eq!(user_summary.total_failed_events, 25);
    assert_eq!(user_summary.total_success_events, 1);
}

#[test]
fn test_unparseable_xml_fails_record_only() {
    let mut events = windows_attack(1700000000);
    events.push(win_event("broken_1", 1700000200, 4625, "<Event><Data"));

    let (output, _, _) = run_analyzer(events);
    assert_eq!(output.result_status, ResultStatus::Success);
    assert_eq!(output.result_priority, Priority::High);
}

#[test]
fn test_search_query_names_security_channel() {
    assert!(WindowsBruteForceAnalyzer::SEARCH_QUERY
        .contains("source_name:Microsoft-Windows-Security-Auditing"));
    assert!(WindowsBruteForceAnalyzer::SEARCH_QUERY.contains("event_identifier:4624"));
    assert!(WindowsBruteForceAnalyzer::RETURN_FIELDS.contains(&"xml_string"));
}

//! Analyzer pipeline: stream → normalize → detect → summarize → report.
//!
//! One invocation issues a single query against the event source, runs the
//! whole analysis in memory, releases the report to the finding sink, and
//! finally hands the brute-forced event IDs to the annotation sink. Only
//! fatal errors (schema mismatch, cancellation, invalid output) fail the
//! invocation; per-record problems are logged and skipped.

use tracing::{debug, info, warn};

use bruteforce_core::{AnalysisError, AnalyzerOutput, AuthRecord, AuthSummary};

use crate::detector::{BruteForceDetector, DetectorConfig};
use crate::normalize::{ssh, windows, ParseOutcome};
use crate::report::{ReportEmitter, ANALYSIS_FAILED_SUMMARY};
use crate::source::{
    Annotation, AnnotationSink, CancelToken, EventSource, FindingSink, RawEvent,
};
use crate::summary_builder::SummaryBuilder;
use crate::table::RecordTable;

/// Counters for one invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub events_streamed: u64,
    pub records_parsed: u64,
    pub records_skipped: u64,
    pub records_malformed: u64,
}

/// Static description of one analyzer flavor.
struct AnalyzerProfile {
    analyzer_identifier: &'static str,
    analyzer_name: &'static str,
    search_query: &'static str,
    return_fields: &'static [&'static str],
    annotation_label: &'static str,
    normalize: fn(&RawEvent) -> ParseOutcome,
    /// Whether a session row should be labeled in the event store.
    annotate_row: fn(&AuthRecord) -> bool,
}

struct BruteForcePipeline {
    profile: AnalyzerProfile,
    config: DetectorConfig,
    stats: RunStats,
}

impl BruteForcePipeline {
    fn new(profile: AnalyzerProfile, config: DetectorConfig) -> Self {
        Self {
            profile,
            config,
            stats: RunStats::default(),
        }
    }

    fn run(
        &mut self,
        source: &mut dyn EventSource,
        annotations: &mut dyn AnnotationSink,
        findings: &mut dyn FindingSink,
        cancel: &CancelToken,
    ) -> AnalyzerOutput {
        let emitter = ReportEmitter::new(
            self.profile.analyzer_identifier,
            self.profile.analyzer_name,
            self.config.min_access_duration,
        );

        let (output, annotate_ids) = match self.analyze(source, cancel) {
            Ok((output, annotate_ids)) => (output, annotate_ids),
            Err(AnalysisError::SchemaMismatch(reason)) => {
                warn!(%reason, "schema mismatch, aborting invocation");
                (emitter.failed(ANALYSIS_FAILED_SUMMARY), Vec::new())
            }
            Err(err) => {
                warn!(error = %err, "analysis failed");
                (emitter.failed(&err.to_string()), Vec::new())
            }
        };

        if let Err(e) = findings.send(&output) {
            warn!(error = %e, "finding sink rejected output");
        }

        if !annotate_ids.is_empty() {
            let annotation = Annotation::starred(self.profile.annotation_label);
            info!(count = annotate_ids.len(), "annotating events");
            if let Err(e) = annotations.annotate(&annotate_ids, &annotation) {
                // The output has already been emitted; annotation failures
                // are not fatal.
                warn!(error = %e, "annotation sink failed");
            }
        }

        info!(
            analyzer = self.profile.analyzer_identifier,
            events = self.stats.events_streamed,
            parsed = self.stats.records_parsed,
            skipped = self.stats.records_skipped,
            malformed = self.stats.records_malformed,
            "invocation complete"
        );

        output
    }

    fn analyze(
        &mut self,
        source: &mut dyn EventSource,
        cancel: &CancelToken,
    ) -> Result<(AnalyzerOutput, Vec<String>), AnalysisError> {
        let emitter = ReportEmitter::new(
            self.profile.analyzer_identifier,
            self.profile.analyzer_name,
            self.config.min_access_duration,
        );

        let records = self.collect_records(source, cancel)?;
        if records.is_empty() {
            info!("no authentication events matched the query");
            return Ok((emitter.empty(), Vec::new()));
        }

        let table = RecordTable::build(records)?;

        let detector = BruteForceDetector::new(self.config.clone());
        let detections = detector.detect(&table, cancel)?;

        let builder = SummaryBuilder::new(&table);
        let mut summaries: Vec<AuthSummary> = Vec::new();
        let mut accounts_seen: Vec<(String, String)> = Vec::new();

        for detection in &detections {
            let Some(mut summary) = builder.ip_summary(&detection.source_ip) else {
                debug!(
                    source_ip = detection.source_ip.as_str(),
                    "no summary for brute-forcing ip"
                );
                continue;
            };
            summary.brute_forces = detection.logins.clone();
            summaries.push(summary);

            for login in &detection.logins {
                let account = (login.domain.clone(), login.username.clone());
                if !accounts_seen.contains(&account) {
                    accounts_seen.push(account);
                }
            }
        }

        for (domain, username) in &accounts_seen {
            if let Some(summary) = builder.user_summary(domain, username) {
                summaries.push(summary);
            }
        }

        let annotate_ids = self.annotation_ids(&table, &detections);
        let output = emitter.emit(summaries)?;
        Ok((output, annotate_ids))
    }

    fn collect_records(
        &mut self,
        source: &mut dyn EventSource,
        cancel: &CancelToken,
    ) -> Result<Vec<AuthRecord>, AnalysisError> {
        let mut records = Vec::new();

        let stream = source.event_stream(self.profile.search_query, self.profile.return_fields);
        for event in stream {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            self.stats.events_streamed += 1;
            match (self.profile.normalize)(&event) {
                ParseOutcome::Parsed(record) => {
                    self.stats.records_parsed += 1;
                    records.push(record);
                }
                ParseOutcome::Skipped(reason) => {
                    self.stats.records_skipped += 1;
                    debug!(event_id = event.event_id.as_str(), reason, "event skipped");
                }
                ParseOutcome::Malformed(reason) => {
                    self.stats.records_malformed += 1;
                    debug!(reason = reason.as_str(), "event dropped");
                }
            }
        }

        Ok(records)
    }

    /// Deduplicated event IDs of the brute-forced sessions, in record
    /// order, filtered by the analyzer's annotation predicate.
    fn annotation_ids(
        &self,
        table: &RecordTable,
        detections: &[crate::detector::IpDetection],
    ) -> Vec<String> {
        let mut ids = Vec::new();

        for detection in detections {
            for login in &detection.logins {
                for row in table.rows_with_session_id(&login.session_id) {
                    if !(self.profile.annotate_row)(row) {
                        continue;
                    }
                    if !ids.contains(&row.event_id) {
                        ids.push(row.event_id.clone());
                    }
                }
            }
        }

        ids
    }
}

/// Brute-force analyzer for SSH syslog authentication events.
pub struct SshBruteForceAnalyzer {
    pipeline: BruteForcePipeline,
}

impl SshBruteForceAnalyzer {
    pub const NAME: &'static str = "analyzer.bruteforce.ssh";
    pub const DISPLAY_NAME: &'static str = "SSH Brute Force Analyzer";
    pub const ANNOTATION_LABEL: &'static str = "ssh_bruteforce";

    pub const SEARCH_QUERY: &'static str = "reporter:sshd AND (body:*Accepted* OR body:*Failed* \
         OR (body:*Disconnected* AND NOT body:*preauth*))";
    pub const RETURN_FIELDS: &'static [&'static str] = &["timestamp", "hostname", "pid", "body"];

    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        let profile = AnalyzerProfile {
            analyzer_identifier: Self::NAME,
            analyzer_name: Self::DISPLAY_NAME,
            search_query: Self::SEARCH_QUERY,
            return_fields: Self::RETURN_FIELDS,
            annotation_label: Self::ANNOTATION_LABEL,
            normalize: ssh::normalize,
            // every record of a brute-forced pseudo-session is labeled
            annotate_row: |_| true,
        };
        Self {
            pipeline: BruteForcePipeline::new(profile, config),
        }
    }

    pub fn run(
        &mut self,
        source: &mut dyn EventSource,
        annotations: &mut dyn AnnotationSink,
        findings: &mut dyn FindingSink,
        cancel: &CancelToken,
    ) -> AnalyzerOutput {
        self.pipeline.run(source, annotations, findings, cancel)
    }

    pub fn stats(&self) -> &RunStats {
        &self.pipeline.stats
    }
}

impl Default for SshBruteForceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Brute-force analyzer for Windows Security logon events.
pub struct WindowsBruteForceAnalyzer {
    pipeline: BruteForcePipeline,
}

impl WindowsBruteForceAnalyzer {
    pub const NAME: &'static str = "analyzer.bruteforce.windows";
    pub const DISPLAY_NAME: &'static str = "Windows Brute Force Analyzer";
    pub const ANNOTATION_LABEL: &'static str = "windows_bruteforce";

    pub const SEARCH_QUERY: &'static str =
        "source_name:Microsoft-Windows-Security-Auditing AND (event_identifier:4624 \
         OR event_identifier:4625 OR event_identifier:4634)";
    pub const RETURN_FIELDS: &'static [&'static str] = &[
        "timestamp",
        "computer_name",
        "event_identifier",
        "xml_string",
    ];

    pub fn new() -> Self {
        Self::with_config(DetectorConfig::windows())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        let profile = AnalyzerProfile {
            analyzer_identifier: Self::NAME,
            analyzer_name: Self::DISPLAY_NAME,
            search_query: Self::SEARCH_QUERY,
            return_fields: Self::RETURN_FIELDS,
            annotation_label: Self::ANNOTATION_LABEL,
            normalize: windows::normalize,
            // label the logon and logoff rows, not the failed attempts
            // leading up to them
            annotate_row: |row| row.is_success() || row.is_disconnection(),
        };
        Self {
            pipeline: BruteForcePipeline::new(profile, config),
        }
    }

    pub fn run(
        &mut self,
        source: &mut dyn EventSource,
        annotations: &mut dyn AnnotationSink,
        findings: &mut dyn FindingSink,
        cancel: &CancelToken,
    ) -> AnalyzerOutput {
        self.pipeline.run(source, annotations, findings, cancel)
    }

    pub fn stats(&self) -> &RunStats {
        &self.pipeline.stats
    }
}

impl Default for WindowsBruteForceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

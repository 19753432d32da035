//! Final report assembly: priority, summary line, and markdown.

use chrono::{TimeZone, Utc};

use bruteforce_core::{
    AnalysisError, AnalyzerOutput, AuthSummary, Priority, ResultStatus, SummaryKind,
};

/// Summary line and markdown body used when nothing was detected.
pub const NO_ACTIVITY_SUMMARY: &str = "No brute force activity";
pub const NO_ACTIVITY_MARKDOWN: &str = "#### Brute Force Analyzer\nNo brute force detected";

/// Summary line used when the invocation failed on a schema error.
pub const ANALYSIS_FAILED_SUMMARY: &str = "Unable to complete analysis";

/// Render a Unix timestamp as a human-readable UTC string.
pub fn human_timestamp(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub struct ReportEmitter {
    analyzer_identifier: String,
    analyzer_name: String,

    /// Session duration, in seconds, above which a brute-forced login is
    /// called out as potential actor activity and the priority is raised.
    min_access_duration: i64,
}

impl ReportEmitter {
    pub fn new(analyzer_identifier: &str, analyzer_name: &str, min_access_duration: i64) -> Self {
        Self {
            analyzer_identifier: analyzer_identifier.to_string(),
            analyzer_name: analyzer_name.to_string(),
            min_access_duration,
        }
    }

    /// Build and validate the output for a completed analysis.
    ///
    /// `summaries` holds the per-IP summaries (with `brute_forces` filled)
    /// followed by the per-account summaries. An empty slice produces the
    /// no-activity output.
    pub fn emit(&self, summaries: Vec<AuthSummary>) -> Result<AnalyzerOutput, AnalysisError> {
        if summaries.is_empty() {
            let output = self.empty();
            output.validate()?;
            return Ok(output);
        }

        let mut output = AnalyzerOutput::new(&self.analyzer_identifier, &self.analyzer_name);
        output.result_status = ResultStatus::Success;
        output.result_priority = self.priority_for(&summaries);
        output.result_summary = self.summary_line(&summaries);
        output.result_markdown = self.markdown(&summaries);
        output.attributes = summaries;

        output.validate()?;
        Ok(output)
    }

    /// Output for an invocation that matched no events or found nothing.
    pub fn empty(&self) -> AnalyzerOutput {
        let mut output = AnalyzerOutput::new(&self.analyzer_identifier, &self.analyzer_name);
        output.result_status = ResultStatus::Success;
        output.result_priority = Priority::Low;
        output.result_summary = NO_ACTIVITY_SUMMARY.to_string();
        output.result_markdown = NO_ACTIVITY_MARKDOWN.to_string();
        output
    }

    /// Output for a fatally failed invocation. Partial attributes are
    /// discarded.
    pub fn failed(&self, summary: &str) -> AnalyzerOutput {
        let mut output = AnalyzerOutput::new(&self.analyzer_identifier, &self.analyzer_name);
        output.result_status = ResultStatus::Failed;
        output.result_priority = Priority::Low;
        output.result_summary = summary.to_string();
        output
    }

    /// Most severe rule wins: CRITICAL for a long brute-forced session,
    /// HIGH for any brute force, LOW otherwise.
    fn priority_for(&self, summaries: &[AuthSummary]) -> Priority {
        let brute_forces = summaries
            .iter()
            .flat_map(|s| s.brute_forces.iter())
            .collect::<Vec<_>>();

        if brute_forces
            .iter()
            .any(|login| login.session_duration >= self.min_access_duration)
        {
            Priority::Critical
        } else if !brute_forces.is_empty() {
            Priority::High
        } else {
            Priority::Low
        }
    }

    fn summary_line(&self, summaries: &[AuthSummary]) -> String {
        let parts: Vec<String> = summaries
            .iter()
            .filter(|s| s.summary_type == SummaryKind::SourceIp && !s.brute_forces.is_empty())
            .map(|s| format!("{} brute force from {}", s.brute_forces.len(), s.source_ip))
            .collect();

        if parts.is_empty() {
            NO_ACTIVITY_SUMMARY.to_string()
        } else {
            parts.join(", ")
        }
    }

    fn markdown(&self, summaries: &[AuthSummary]) -> String {
        let mut lines = vec!["#### Brute Force Analyzer".to_string()];

        for summary in summaries
            .iter()
            .filter(|s| s.summary_type == SummaryKind::SourceIp && !s.brute_forces.is_empty())
        {
            lines.push(String::new());
            lines.push(format!("### Brute Force Summary for {}", summary.source_ip));

            for login in &summary.brute_forces {
                if login.session_duration >= self.min_access_duration {
                    lines.push(format!(
                        "- Potential actor activity - long active session of {} seconds",
                        login.session_duration
                    ));
                }
                lines.push(format!(
                    "- Successful brute force on {} as {}",
                    human_timestamp(login.timestamp),
                    login.username
                ));
            }

            lines.push(String::new());
            lines.push(format!("#### {} Summary", summary.source_ip));
            lines.push(format!(
                "- IP first seen on {}",
                human_timestamp(summary.first_seen)
            ));
            lines.push(format!(
                "- IP last seen on {}",
                human_timestamp(summary.last_seen)
            ));

            if let Some(first_auth) = &summary.first_auth {
                lines.push(format!(
                    "- First successful authentication on {}",
                    human_timestamp(first_auth.timestamp)
                ));
                lines.push(format!(
                    "- First successful login from {}",
                    first_auth.source_ip
                ));
                lines.push(format!(
                    "- First successful login as {}",
                    first_auth.username
                ));
            }

            if !summary.top_usernames.is_empty() {
                lines.push(String::new());
                lines.push("#### Top Usernames".to_string());
                let mut ranked: Vec<(&String, &u64)> = summary.top_usernames.iter().collect();
                ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (username, count) in ranked {
                    lines.push(format!("- {username}: {count}"));
                }
            }
        }

        lines.join("\n")
    }
}

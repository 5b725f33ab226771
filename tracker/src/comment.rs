use crate::{
    client::{Comment, Issue, Tracker},
    config::TrackerConfig,
    error::{ReportError, ReportResult},
};
use common::{Outcome, Status};
use std::fmt::Write;
use tracing::info;

/// Renders the report comment for one outcome.
pub fn format_comment(outcome: &Outcome, config: &TrackerConfig) -> String {
    let marker = match outcome.status {
        Status::Pass => "✅ PASS",
        Status::Fail => "❌ FAIL",
    };

    let mut comment = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        comment,
        "🤖 Automated Test Report\n\
         ------------------------\n\
         📅 Date: {date}\n\
         📊 Status: {marker}\n\
         ⏱️ Execution Time: {secs:.2} seconds\n\
         🔍 Test Run Details:\n\
         - Test ID: {ticket}\n\
         - Test Function: {name}\n\
         - Environment: {environment}\n\
         - Test Framework: {framework}\n\
         - Machine: {machine}\n",
        date = outcome.timestamp.format("%Y-%m-%d %H:%M:%S"),
        marker = marker,
        secs = outcome.duration_secs(),
        ticket = outcome.ticket,
        name = outcome.test_name,
        environment = config.environment,
        framework = config.framework,
        machine = config.machine,
    );

    if let Some(error) = &outcome.error {
        let _ = write!(
            comment,
            "\n❌ Error Details:\n\
             Error Type: {}\n\
             Error Message: {}\n\
             Test Duration: {:.2} seconds\n",
            error.type_name,
            error.message,
            outcome.duration_secs(),
        );
    }

    comment
}

/// Posts the report for `outcome` on `issue`.
pub async fn post(
    tracker: &dyn Tracker,
    issue: &Issue,
    outcome: &Outcome,
    config: &TrackerConfig,
) -> ReportResult<Comment> {
    let body = format_comment(outcome, config);
    let comment = tracker
        .add_comment(issue, &body)
        .await
        .map_err(|source| ReportError::Reporting {
            key: issue.key.clone(),
            source,
        })?;
    info!(ticket = %issue.key, comment = %comment.id, status = %outcome.status, "comment added");
    Ok(comment)
}

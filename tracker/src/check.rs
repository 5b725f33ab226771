//! Pre-flight check of the tracker integration: server, project, issues and commenting.

use crate::{client::Tracker, resolver::Resolver};
use chrono::Local;
use common::TicketKey;
use std::fmt::{Display, Formatter};
use tracing::{error, info, warn};

pub const MAX_LISTED_PROJECTS: usize = 10;
pub const MAX_PROJECT_ISSUES: u32 = 50;

#[derive(Debug, Clone)]
pub struct ConnectionCheck {
    pub project: String,
    pub issues: Vec<TicketKey>,
    /// Leave a test comment on the first issue found.
    pub comment: bool,
}

impl Default for ConnectionCheck {
    fn default() -> Self {
        ConnectionCheck {
            project: "KAN".to_string(),
            issues: ["KAN-1", "KAN-2", "KAN-3"]
                .iter()
                .filter_map(|key| TicketKey::new(*key).ok())
                .collect(),
            comment: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    Working,
    Partial,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Working => write!(f, "WORKING"),
            Verdict::Partial => write!(f, "PARTIAL (no test issues found)"),
        }
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub server_version: Option<String>,
    pub project_found: bool,
    /// Projects listed when the configured one was not accessible.
    pub available_projects: Vec<String>,
    pub issues_found: Vec<TicketKey>,
    pub issues_expected: usize,
    pub project_issues: Option<usize>,
    pub comment_posted: bool,
}

impl CheckReport {
    pub fn verdict(&self) -> Verdict {
        if self.issues_found.is_empty() {
            Verdict::Partial
        } else {
            Verdict::Working
        }
    }
}

impl ConnectionCheck {
    pub async fn run(&self, tracker: &dyn Tracker, resolver: &Resolver) -> CheckReport {
        let mut report = CheckReport {
            issues_expected: self.issues.len(),
            ..Default::default()
        };

        match tracker.server_info().await {
            Ok(server) => {
                info!(
                    version = server.version.as_deref().unwrap_or("Unknown"),
                    build = ?server.build_number,
                    "connected to tracker server"
                );
                report.server_version = server.version;
            }
            Err(err) => warn!(error = %err, "could not get server info"),
        }

        match tracker.project(&self.project).await {
            Ok(project) => {
                info!(
                    key = %project.key,
                    name = %project.name,
                    lead = project.lead.as_ref().map(|lead| lead.display_name.as_str()).unwrap_or("Unknown"),
                    "found project"
                );
                report.project_found = true;
            }
            Err(err) => {
                error!(project = %self.project, error = %err, "could not access project, listing available ones");
                match tracker.projects().await {
                    Ok(projects) => {
                        info!(count = projects.len(), "available projects");
                        for project in projects.iter().take(MAX_LISTED_PROJECTS) {
                            info!(key = %project.key, name = %project.name, "project");
                            report.available_projects.push(project.key.clone());
                        }
                    }
                    Err(err) => error!(error = %err, "could not list projects"),
                }
            }
        }

        let mut first_issue = None;
        for key in &self.issues {
            match resolver.resolve(tracker, key).await {
                Ok(issue) => {
                    info!(
                        ticket = %issue.key,
                        summary = issue.summary(),
                        status = issue.status_name(),
                        "issue accessible"
                    );
                    report.issues_found.push(issue.key.clone());
                    if first_issue.is_none() {
                        first_issue = Some(issue);
                    }
                }
                Err(err) => error!(error = %err, "issue not accessible"),
            }
        }

        let jql = format!("project = {} ORDER BY key ASC", self.project);
        match tracker.search_issues(&jql, MAX_PROJECT_ISSUES).await {
            Ok(issues) => {
                info!(count = issues.len(), project = %self.project, "project issues");
                for issue in &issues {
                    info!(ticket = %issue.key, summary = issue.summary(), status = issue.status_name(), "issue");
                }
                report.project_issues = Some(issues.len());
            }
            Err(err) => error!(error = %err, "could not list project issues"),
        }

        if self.comment {
            match &first_issue {
                Some(issue) => {
                    let body = format!(
                        "🧪 Test comment from tracker-check - {}",
                        Local::now().format("%Y-%m-%d %H:%M:%S")
                    );
                    match tracker.add_comment(issue, &body).await {
                        Ok(_) => {
                            info!(ticket = %issue.key, "test comment added");
                            report.comment_posted = true;
                        }
                        Err(err) => error!(ticket = %issue.key, error = %err, "could not add comment"),
                    }
                }
                None => warn!("skipping comment check, no issues available"),
            }
        }

        match report.verdict() {
            Verdict::Working => info!(
                found = report.issues_found.len(),
                expected = report.issues_expected,
                "tracker integration: {}",
                Verdict::Working
            ),
            Verdict::Partial => warn!(
                found = report.issues_found.len(),
                expected = report.issues_expected,
                "tracker integration: {}",
                Verdict::Partial
            ),
        }

        report
    }
}

//! Wraps test functions so every run leaves a comment on its ticket.
//!
//! The reporting path is best effort: whatever happens while resolving the
//! ticket or posting the comment is logged and dropped, and the caller always
//! gets back exactly what the test produced (value, error or panic).

use crate::{
    client::{Comment, JiraClient, Tracker},
    comment,
    config::TrackerConfig,
    error::{ConfigError, ReportError, ReportResult},
    resolver::Resolver,
};
use common::{ErrorDetail, Outcome, Status, TicketKey};
use futures::FutureExt;
use std::{
    any::{type_name, Any},
    fmt::Display,
    future::Future,
    panic::{resume_unwind, AssertUnwindSafe},
    time::Instant,
};
use tracing::{error, info, warn};

/// What a single reported invocation is about.
#[derive(Debug, Clone)]
pub struct TestRun {
    pub ticket: TicketKey,
    pub test_name: String,
    pub description: Option<String>,
}

impl TestRun {
    pub fn new(ticket: TicketKey, test_name: impl Into<String>) -> Self {
        TestRun {
            ticket,
            test_name: test_name.into(),
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Reporting(Status),
    Done,
}

/// Start/end markers around one invocation. The end marker is emitted on drop,
/// so it also fires while a panic unwinds.
struct Invocation<'a> {
    run: &'a TestRun,
    phase: Phase,
}

impl<'a> Invocation<'a> {
    fn start(run: &'a TestRun) -> Self {
        let mut invocation = Invocation {
            run,
            phase: Phase::NotStarted,
        };
        info!(
            ticket = %run.ticket,
            test = %run.test_name,
            description = run.description.as_deref().unwrap_or(""),
            "tracker integration start"
        );
        invocation.phase = Phase::Running;
        invocation
    }

    fn reporting(&mut self, status: Status) {
        debug_assert_eq!(self.phase, Phase::Running);
        self.phase = Phase::Reporting(status);
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        let last = std::mem::replace(&mut self.phase, Phase::Done);
        info!(
            ticket = %self.run.ticket,
            test = %self.run.test_name,
            last_phase = ?last,
            "tracker integration end"
        );
    }
}

pub struct Reporter {
    config: TrackerConfig,
    resolver: Resolver,
}

impl Reporter {
    pub fn new(config: TrackerConfig) -> Self {
        Reporter {
            config,
            resolver: Resolver::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Reporter::new(TrackerConfig::from_env()?))
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Resolves the outcome's ticket and comments on it, using a client built for this call only.
    pub async fn report(&self, outcome: &Outcome) -> ReportResult<Comment> {
        let client = JiraClient::connect(&self.config).map_err(ReportError::Client)?;
        self.report_to(&client, outcome).await
    }

    pub async fn report_to(&self, tracker: &dyn Tracker, outcome: &Outcome) -> ReportResult<Comment> {
        info!(ticket = %outcome.ticket, status = %outcome.status, "updating issue");
        let issue = self.resolver.resolve(tracker, &outcome.ticket).await?;
        comment::post(tracker, &issue, outcome, &self.config).await
    }

    async fn report_best_effort(&self, outcome: Outcome) {
        match self.report(&outcome).await {
            Ok(_) => info!(ticket = %outcome.ticket, status = %outcome.status, "issue updated"),
            Err(err) => warn!(ticket = %outcome.ticket, error = %err, "could not update issue"),
        }
    }

    /// Runs `test`, reports its outcome and hands back its result unchanged.
    pub async fn observe<Fut, T, E>(&self, run: &TestRun, test: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.observe_with(run, test, ErrorDetail::of).await
    }

    /// Like [`observe`](Self::observe), with a custom way of describing the test's error.
    pub async fn observe_with<Fut, T, E, D>(&self, run: &TestRun, test: Fut, describe: D) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        D: FnOnce(&E) -> ErrorDetail,
    {
        let mut invocation = Invocation::start(run);
        let started = Instant::now();
        let result = AssertUnwindSafe(test).catch_unwind().await;
        let elapsed = started.elapsed();

        match result {
            Ok(Ok(value)) => {
                info!(test = %run.test_name, secs = elapsed.as_secs_f64(), "test passed");
                invocation.reporting(Status::Pass);
                let outcome = Outcome::passed(run.ticket.clone(), &run.test_name, elapsed);
                self.report_best_effort(outcome).await;
                Ok(value)
            }
            Ok(Err(err)) => {
                let detail = describe(&err);
                error!(test = %run.test_name, secs = elapsed.as_secs_f64(), error = %detail.message, "test failed");
                invocation.reporting(Status::Fail);
                let outcome = Outcome::failed(run.ticket.clone(), &run.test_name, elapsed, detail);
                self.report_best_effort(outcome).await;
                Err(err)
            }
            Err(payload) => {
                let detail = ErrorDetail::new("panic", panic_message(payload.as_ref()));
                error!(test = %run.test_name, secs = elapsed.as_secs_f64(), error = %detail.message, "test panicked");
                invocation.reporting(Status::Fail);
                let outcome = Outcome::failed(run.ticket.clone(), &run.test_name, elapsed, detail);
                self.report_best_effort(outcome).await;
                drop(invocation);
                resume_unwind(payload)
            }
        }
    }

    /// Wraps `test` for `ticket`; call it with [`Around::call`].
    pub fn around<F>(&self, ticket: TicketKey, test: F) -> Around<'_, F> {
        Around {
            reporter: self,
            run: TestRun::new(ticket, type_name::<F>()),
            test,
        }
    }
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown error".to_string()
    }
}

/// A test function bound to a ticket.
pub struct Around<'r, F> {
    reporter: &'r Reporter,
    run: TestRun,
    test: F,
}

impl<'r, F> Around<'r, F> {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.run.description = Some(description.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.run.test_name = name.into();
        self
    }

    pub fn run(&self) -> &TestRun {
        &self.run
    }

    pub async fn call<A, Fut, T, E>(&self, arg: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.reporter.observe(&self.run, (self.test)(arg)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::FakeTracker;
    use std::time::Duration;

    fn reporter() -> Reporter {
        Reporter::new(TrackerConfig::new("qa", "token").unwrap())
    }

    #[test]
    fn invocation_ends_in_done() {
        let run = TestRun::new(TicketKey::new("KAN-1").unwrap(), "t");
        let mut invocation = Invocation::start(&run);
        assert_eq!(invocation.phase, Phase::Running);
        invocation.reporting(Status::Fail);
        assert_eq!(invocation.phase, Phase::Reporting(Status::Fail));
    }

    #[test]
    fn panic_messages() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "Unknown error");
    }

    #[tokio::test]
    async fn report_to_posts_on_resolved_issue() {
        let tracker = FakeTracker {
            direct: vec!["KAN-9"],
            ..Default::default()
        };
        let outcome = Outcome::passed(
            TicketKey::new("KAN-9").unwrap(),
            "answer",
            Duration::from_millis(10),
        );

        reporter().report_to(&tracker, &outcome).await.unwrap();

        let comments = tracker.comments.lock().unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].1.contains("KAN-9"));
    }

    #[tokio::test]
    async fn report_to_unknown_ticket_is_not_found() {
        let tracker = FakeTracker::default();
        let outcome = Outcome::passed(TicketKey::new("KAN-0").unwrap(), "t", Duration::ZERO);

        let err = reporter().report_to(&tracker, &outcome).await.unwrap_err();

        assert!(matches!(err, ReportError::NotFound(_)));
        assert!(tracker.comments.lock().unwrap().is_empty());
    }

    #[test]
    fn around_defaults_name_to_function_path() {
        async fn answer(_: ()) -> Result<u32, std::io::Error> {
            Ok(42)
        }
        let reporter = reporter();
        let wrapped = reporter
            .around(TicketKey::new("KAN-9").unwrap(), answer)
            .describe("the answer");
        assert!(wrapped.run().test_name.ends_with("answer"));
        assert_eq!(wrapped.run().description.as_deref(), Some("the answer"));
    }
}

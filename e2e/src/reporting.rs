use crate::{page::AssertionFailed, CaughtPanic, Context, Testable};
use anyhow::Result;
use async_trait::async_trait;
use common::{ErrorDetail, TicketKey};
use tracker::{Reporter, TestRun};

/// A test whose every run is reported on a ticket.
pub struct Reported<'r, T> {
    reporter: &'r Reporter,
    ticket: TicketKey,
    description: Option<&'static str>,
    test: T,
}

pub fn reported<'r, T: Testable>(
    reporter: &'r Reporter,
    ticket: TicketKey,
    description: &'static str,
    test: T,
) -> Reported<'r, T> {
    Reported {
        reporter,
        ticket,
        description: Some(description),
        test,
    }
}

#[async_trait]
impl<'r, T: Testable + Sync> Testable for Reported<'r, T> {
    fn name(&self) -> &'static str {
        self.test.name()
    }

    async fn run(&self, ctx: Context) -> Result<()> {
        let mut run = TestRun::new(
            self.ticket.clone(),
            format!("{} [{}]", self.test.name(), ctx.browser),
        );
        if let Some(description) = self.description {
            run = run.describe(description);
        }
        self.reporter
            .observe_with(&run, self.test.run(ctx), describe_failure)
            .await
    }
}

pub fn describe_failure(err: &anyhow::Error) -> ErrorDetail {
    if let Some(panic) = err.downcast_ref::<CaughtPanic>() {
        ErrorDetail::new("panic", panic.to_string())
    } else if let Some(assertion) = err.downcast_ref::<AssertionFailed>() {
        ErrorDetail::new("AssertionFailed", assertion.to_string())
    } else {
        ErrorDetail::new("Error", format!("{:#}", err))
    }
}

use anyhow::Result;
use async_trait::async_trait;
use std::{
    error::Error,
    fmt::{Display, Formatter},
    path::Path,
    time::Duration,
};
use tokio::time::{sleep, Instant};

pub const EXPECT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a test may do with its browser tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn is_visible(&self, selector: &str) -> Result<bool>;

    async fn text(&self, selector: &str) -> Result<String>;

    async fn screenshot(&self, path: &Path) -> Result<()>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    async fn close(&self) -> Result<()>;
}

/// Retrying assertions on top of [`BrowserPage`], in the spirit of Playwright's `expect`.
#[async_trait]
pub trait Expect: BrowserPage {
    async fn assert_visible(&self, selector: &str) -> Result<()> {
        self.assert_visible_within(selector, EXPECT_TIMEOUT).await
    }

    async fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        self.assert_text_within(selector, expected, EXPECT_TIMEOUT)
            .await
    }

    async fn assert_visible_within(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_visible(selector).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AssertionFailed {
                    selector: selector.to_string(),
                    expected: "to be visible".to_string(),
                    actual: "hidden".to_string(),
                }
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn assert_text_within(
        &self,
        selector: &str,
        expected: &str,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            // A missing element counts as "no text yet" until the deadline.
            let actual = self.text(selector).await.ok();
            if actual.as_deref().map(str::trim) == Some(expected) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AssertionFailed {
                    selector: selector.to_string(),
                    expected: format!("to have text {:?}", expected),
                    actual: match actual {
                        Some(text) => format!("{:?}", text),
                        None => "no element".to_string(),
                    },
                }
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

impl<P: BrowserPage + ?Sized> Expect for P {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailed {
    pub selector: String,
    pub expected: String,
    pub actual: String,
}

impl Display for AssertionFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {} {}, got {}",
            self.selector, self.expected, self.actual
        )
    }
}

impl Error for AssertionFailed {}

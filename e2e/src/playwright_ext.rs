use crate::{page::BrowserPage, BrowserType, ErrorList, PageSource, RunnerConfig};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use playwright::{
    api::{Browser, BrowserContext, Page},
    Playwright,
};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    path::Path,
    sync::Arc,
};

/// Launched browsers, one fresh context and page per test.
pub struct PlaywrightPages {
    _playwright: Playwright,
    order: Vec<BrowserType>,
    browsers: HashMap<BrowserType, Browser>,
}

impl PlaywrightPages {
    pub async fn launch(config: &RunnerConfig) -> Result<Self> {
        let playwright = Playwright::initialize().await?;
        playwright.prepare()?; // Install browsers

        let mut browser_map = HashMap::new();
        let mut initialization_errors: Option<ErrorList<FailedToInitialize>> = None;
        for &browser_type in &config.browsers {
            let launcher = match browser_type {
                BrowserType::Chromium => playwright.chromium(),
                BrowserType::Firefox => playwright.firefox(),
                BrowserType::Webkit => playwright.webkit(),
            };
            match launcher.launcher().headless(config.headless).launch().await {
                Ok(browser) => {
                    browser_map.insert(browser_type, browser);
                }
                Err(err) => {
                    if let Some(errs) = &mut initialization_errors {
                        errs.push(FailedToInitialize(browser_type), err);
                    } else {
                        initialization_errors =
                            Some(ErrorList::new(FailedToInitialize(browser_type), err));
                    }
                }
            }
        }

        if let Some(errors) = initialization_errors {
            return Err(errors.into());
        }

        Ok(PlaywrightPages {
            _playwright: playwright,
            order: config.browsers.clone(),
            browsers: browser_map,
        })
    }
}

#[async_trait]
impl PageSource for PlaywrightPages {
    fn browsers(&self) -> Vec<BrowserType> {
        self.order.clone()
    }

    async fn open_page(&self, browser_type: BrowserType) -> Result<Arc<dyn BrowserPage>> {
        let browser = self
            .browsers
            .get(&browser_type)
            .ok_or_else(|| anyhow!("{} was not launched", browser_type))?;
        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;
        Ok(Arc::new(PlaywrightPage { context, page }))
    }
}

struct PlaywrightPage {
    context: BrowserContext,
    page: Page,
}

#[async_trait]
impl BrowserPage for PlaywrightPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto_builder(url).goto().await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.page.fill_builder(selector, text).fill().await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page.click_builder(selector).click().await?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self.page.is_visible(selector, None).await?)
    }

    async fn text(&self, selector: &str) -> Result<String> {
        Ok(self.page.inner_text(selector, None).await?)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.page
            .screenshot_builder()
            .path(path.to_path_buf())
            .screenshot()
            .await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        Ok(self.page.eval::<serde_json::Value>(script).await?)
    }

    async fn close(&self) -> Result<()> {
        self.page.close(None).await?;
        self.context.close().await?;
        Ok(())
    }
}

struct FailedToInitialize(BrowserType);

impl Display for FailedToInitialize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to initialize {}", self.0)
    }
}

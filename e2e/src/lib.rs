use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::{stream, FutureExt, StreamExt};
use serde::Serialize;
use std::{
    any::{type_name, Any},
    error::Error,
    fmt::{Debug, Display, Formatter},
    future::Future,
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::warn;

pub mod page;
#[cfg(feature = "browser")]
pub mod playwright_ext;
pub mod reporting;
pub mod scenarios;

#[cfg(test)]
mod fake;

pub use page::{AssertionFailed, BrowserPage, Expect};
pub use reporting::{reported, Reported};

pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com/";

/// Runs `tests` in real browsers, prints a summary, writes the JSON report and exits.
#[cfg(feature = "browser")]
pub fn e2e_test_runner(tests: &[&dyn Testable]) {
    use tokio::runtime::Runtime;

    tracker::init_tracing();

    let exit_code = match RunnerConfig::from_env() {
        Ok(config) => match Runtime::new() {
            Ok(runtime) => match runtime.block_on(run_in_browsers(tests, &config)) {
                Ok(test_results) => {
                    if let Err(error) = write_report(&test_results, &config.report_path) {
                        println!("Could not write report: {:#}", error);
                    }
                    summarize(&test_results)
                }
                Err(error) => {
                    println!("{:#?}", error);
                    1
                }
            },
            Err(error) => {
                println!("Could not start runtime: {}", error);
                1
            }
        },
        Err(error) => {
            println!("{:#}", error);
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(feature = "browser")]
async fn run_in_browsers(tests: &[&dyn Testable], config: &RunnerConfig) -> Result<Vec<TestResult>> {
    for browser_type in &config.browsers {
        std::fs::create_dir_all(config.artifacts_for(*browser_type))?;
    }
    let pages = playwright_ext::PlaywrightPages::launch(config).await?;
    run_tests(tests, &pages, config).await
}

/// Prints every result and the totals; returns the process exit code.
pub fn summarize(test_results: &[TestResult]) -> i32 {
    println!("\nSummary:");

    for test_result in test_results {
        println!("{}", test_result);
    }

    let successes = test_results
        .iter()
        .filter(|test_result| test_result.result.is_ok())
        .count();
    if successes == test_results.len() {
        println!("{} tests ran with success", successes);
        0
    } else {
        println!("{} errors", test_results.len() - successes);
        1
    }
}

/// Opens a fresh page for every (test, browser) pair, runs the test and closes the page.
pub async fn run_tests(
    tests: &[&dyn Testable],
    pages: &dyn PageSource,
    config: &RunnerConfig,
) -> Result<Vec<TestResult>> {
    let browsers = pages.browsers();

    let (results, error_list) = stream::iter(tests)
        .flat_map(|test| {
            stream::iter(browsers.iter()).map(move |&browser_type| async move {
                let page = pages.open_page(browser_type).await.map_err(|err| {
                    (
                        FailedToOpenPage {
                            browser_type,
                            test_name: test.name(),
                        },
                        err,
                    )
                })?;
                let ctx = Context {
                    page: page.clone(),
                    browser: browser_type,
                    base_url: config.base_url.clone(),
                    artifacts: config.artifacts_for(browser_type),
                };
                let test_name = test.name();
                let started = Instant::now();
                let test_result = test
                    .run(ctx)
                    .map(|result| TestResult {
                        test_name,
                        browser_type,
                        duration: started.elapsed(),
                        result,
                    })
                    .inspect(|test_result| println!("{}", test_result))
                    .await;
                if let Err(err) = page.close().await {
                    warn!(test = test_name, browser = %browser_type, error = %err, "failed to close page");
                }
                Ok::<_, (FailedToOpenPage, anyhow::Error)>(test_result)
            })
        })
        .fold(
            (Vec::new(), None),
            |(mut test_results, errors), result| async {
                match (result.await, errors) {
                    (Ok(test_result), errors) => {
                        test_results.push(test_result);
                        (test_results, errors)
                    }
                    (Err((context, err)), None) => {
                        (test_results, Some(ErrorList::new(context, err)))
                    }
                    (Err((context, err)), Some(mut error_list)) => {
                        error_list.push(context, err);
                        (test_results, Some(error_list))
                    }
                }
            },
        )
        .await;

    if let Some(error_list) = error_list {
        return Err(error_list.into());
    }

    Ok(results)
}

#[derive(Debug)]
pub struct TestResult {
    pub test_name: &'static str,
    pub browser_type: BrowserType,
    pub duration: Duration,
    pub result: anyhow::Result<()>,
}

impl Display for TestResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "{} in {}...\t[OK]", self.test_name, self.browser_type),
            Err(err) => write!(
                f,
                "{} in {}...\t[FAILED]\n{:#?}",
                self.test_name, self.browser_type, err
            ),
        }
    }
}

#[derive(Serialize)]
struct SuiteReport<'a> {
    total: usize,
    passed: usize,
    failed: usize,
    results: Vec<ReportEntry<'a>>,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    test: &'a str,
    browser: BrowserType,
    passed: bool,
    duration_ms: u128,
    error: Option<String>,
}

/// Writes the results as JSON to `path`, creating parent directories.
pub fn write_report(test_results: &[TestResult], path: &Path) -> Result<()> {
    let results: Vec<ReportEntry> = test_results
        .iter()
        .map(|test_result| ReportEntry {
            test: test_result.test_name,
            browser: test_result.browser_type,
            passed: test_result.result.is_ok(),
            duration_ms: test_result.duration.as_millis(),
            error: test_result
                .result
                .as_ref()
                .err()
                .map(|err| format!("{:#}", err)),
        })
        .collect();
    let passed = results.iter().filter(|entry| entry.passed).count();
    let report = SuiteReport {
        total: results.len(),
        passed,
        failed: results.len() - passed,
        results,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(&report)?)?;
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Eq, Hash, Serialize)]
pub enum BrowserType {
    Chromium,
    Firefox,
    Webkit,
}

impl Display for BrowserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BrowserType::Chromium => "Chromium",
                BrowserType::Firefox => "Firefox",
                BrowserType::Webkit => "Webkit",
            }
        )
    }
}

impl FromStr for BrowserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserType::Chromium),
            "firefox" => Ok(BrowserType::Firefox),
            "webkit" | "safari" => Ok(BrowserType::Webkit),
            other => Err(anyhow!("unknown browser {:?}", other)),
        }
    }
}

/// Runner settings, read from `E2E_*` environment variables.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub base_url: String,
    pub browsers: Vec<BrowserType>,
    pub headless: bool,
    /// Screenshots land in `<artifacts>/<browser>/`.
    pub artifacts: PathBuf,
    pub report_path: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            browsers: vec![BrowserType::Chromium],
            headless: true,
            artifacts: PathBuf::from("test-results"),
            report_path: PathBuf::from("test-results/report.json"),
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = RunnerConfig::default();
        if let Some(base_url) = lookup("E2E_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(browsers) = lookup("E2E_BROWSERS") {
            config.browsers = browsers
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(BrowserType::from_str)
                .collect::<Result<_>>()?;
            if config.browsers.is_empty() {
                return Err(anyhow!("E2E_BROWSERS names no browser"));
            }
        }
        if let Some(headless) = lookup("E2E_HEADLESS") {
            config.headless = !matches!(headless.trim(), "0" | "false" | "no");
        }
        if let Some(artifacts) = lookup("E2E_ARTIFACTS") {
            config.artifacts = PathBuf::from(artifacts);
        }
        if let Some(report_path) = lookup("E2E_REPORT_PATH") {
            config.report_path = PathBuf::from(report_path);
        }
        Ok(config)
    }

    pub fn artifacts_for(&self, browser_type: BrowserType) -> PathBuf {
        self.artifacts
            .join(browser_type.to_string().to_ascii_lowercase())
    }
}

/// Everything a test gets: its own page plus where it runs.
pub struct Context {
    pub page: Arc<dyn BrowserPage>,
    pub browser: BrowserType,
    pub base_url: String,
    pub artifacts: PathBuf,
}

impl Context {
    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.artifacts.join(file_name)
    }
}

/// Where the runner gets its pages from.
#[async_trait]
pub trait PageSource: Sync {
    fn browsers(&self) -> Vec<BrowserType>;

    async fn open_page(&self, browser_type: BrowserType) -> Result<Arc<dyn BrowserPage>>;
}

#[async_trait]
pub trait Testable {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: Context) -> Result<()>;
}

#[async_trait]
impl<F, FF> Testable for F
where
    F: Fn(Context) -> FF + Sync,
    FF: Send,
    AssertUnwindSafe<FF>: Future<Output = Result<()>>,
{
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    async fn run(&self, ctx: Context) -> Result<()> {
        let result = AssertUnwindSafe(self(ctx)).catch_unwind().await;
        match result {
            Ok(future) => future,
            Err(err) => Err(CaughtPanic::new(err).into()),
        }
    }
}

pub(crate) struct ErrorList<C> {
    vec: Vec<(C, anyhow::Error)>,
}

impl<C> ErrorList<C> {
    pub(crate) fn new<E: Into<anyhow::Error>>(context: C, error: E) -> Self {
        ErrorList {
            vec: vec![(context, error.into())],
        }
    }

    pub(crate) fn push<E: Into<anyhow::Error>>(&mut self, context: C, error: E) {
        self.vec.push((context, error.into()));
    }
}

impl<C: Display> Debug for ErrorList<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ErrorList:")?;
        for (context, error) in &self.vec {
            writeln!(f, "\t- {}: {:#?}", context, error)?;
        }
        Ok(())
    }
}

impl<C: Display> Display for ErrorList<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ErrorList:")?;
        for (context, error) in &self.vec {
            writeln!(f, "\t- {}: {}", context, error)?;
        }
        Ok(())
    }
}

impl<C: Display> Error for ErrorList<C> {}

struct FailedToOpenPage {
    test_name: &'static str,
    browser_type: BrowserType,
}

impl Display for FailedToOpenPage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to open page in {} of {}",
            self.browser_type, self.test_name
        )
    }
}

pub(crate) struct CaughtPanic(Option<Box<str>>);

impl CaughtPanic {
    fn new(err: Box<dyn Any + Send + 'static>) -> Self {
        match err.downcast::<String>() {
            Ok(str) => CaughtPanic(Some(str.into_boxed_str())),
            Err(err) => match err.downcast::<&str>() {
                Ok(str) => CaughtPanic(Some(str.to_string().into_boxed_str())),
                Err(_) => CaughtPanic(None),
            },
        }
    }
}

impl Debug for CaughtPanic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for CaughtPanic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(str_err) => write!(f, "{}", str_err),
            None => write!(f, "Unknown error"),
        }
    }
}

impl Error for CaughtPanic {}

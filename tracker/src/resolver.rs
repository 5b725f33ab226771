//! Locating a ticket by key: direct lookup first, then a JQL search.

use crate::{
    client::{Issue, Tracker},
    error::{ApiError, Miss, NotFound},
};
use async_trait::async_trait;
use common::TicketKey;
use std::fmt::{Display, Formatter};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum Lookup {
    Api(ApiError),
    NoResults(String),
}

impl Display for Lookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Api(err) => write!(f, "{}", err),
            Lookup::NoResults(jql) => write!(f, "no results for `{}`", jql),
        }
    }
}

impl From<ApiError> for Lookup {
    fn from(err: ApiError) -> Self {
        Lookup::Api(err)
    }
}

/// One way of turning a key into an issue.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn locate(&self, tracker: &dyn Tracker, key: &TicketKey) -> Result<Issue, Lookup>;
}

pub struct DirectLookup;

#[async_trait]
impl Strategy for DirectLookup {
    fn name(&self) -> &'static str {
        "direct lookup"
    }

    async fn locate(&self, tracker: &dyn Tracker, key: &TicketKey) -> Result<Issue, Lookup> {
        Ok(tracker.issue(key).await?)
    }
}

pub struct KeySearch;

impl KeySearch {
    pub fn jql(key: &TicketKey) -> String {
        format!("key = \"{}\"", key.as_str().replace('"', "\\\""))
    }
}

#[async_trait]
impl Strategy for KeySearch {
    fn name(&self) -> &'static str {
        "key search"
    }

    async fn locate(&self, tracker: &dyn Tracker, key: &TicketKey) -> Result<Issue, Lookup> {
        let jql = KeySearch::jql(key);
        debug!(%jql, "searching for issue");
        tracker
            .search_issues(&jql, 1)
            .await?
            .into_iter()
            .next()
            .ok_or(Lookup::NoResults(jql))
    }
}

/// Tries each strategy in order and stops at the first hit.
pub struct Resolver {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::new(vec![Box::new(DirectLookup), Box::new(KeySearch)])
    }
}

impl Resolver {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Resolver { strategies }
    }

    pub async fn resolve(&self, tracker: &dyn Tracker, key: &TicketKey) -> Result<Issue, NotFound> {
        let mut misses = Vec::new();

        for strategy in &self.strategies {
            match strategy.locate(tracker, key).await {
                Ok(issue) => {
                    info!(ticket = %key, strategy = strategy.name(), "found issue");
                    return Ok(issue);
                }
                Err(err) => {
                    warn!(ticket = %key, strategy = strategy.name(), error = %err, "lookup failed");
                    misses.push(Miss {
                        strategy: strategy.name(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(NotFound {
            key: key.clone(),
            misses,
        })
    }
}

//! Error types for the reporting path

use common::TicketKey;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Raised while building a [`TrackerConfig`](crate::TrackerConfig), before any network call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failure talking to the tracker's REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ApiError {
    /// Timeouts and refused connections are worth a second attempt; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    /// The connection was never established, so the server saw nothing.
    pub fn is_connect(&self) -> bool {
        matches!(self, ApiError::Http(err) if err.is_connect())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(err) => err.status().map(|s| s.as_u16()),
            ApiError::Decode { .. } => None,
        }
    }
}

/// One failed way of locating a ticket.
#[derive(Debug, Clone)]
pub struct Miss {
    pub strategy: &'static str,
    pub reason: String,
}

/// No resolution strategy located the ticket.
#[derive(Error, Debug)]
pub struct NotFound {
    pub key: TicketKey,
    pub misses: Vec<Miss>,
}

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not find issue {}", self.key)?;
        for (i, miss) in self.misses.iter().enumerate() {
            let sep = if i == 0 { " (" } else { "; " };
            write!(f, "{}{}: {}", sep, miss.strategy, miss.reason)?;
        }
        if !self.misses.is_empty() {
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to build tracker client: {0}")]
    Client(#[source] ApiError),

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("failed to comment on {key}: {source}")]
    Reporting {
        key: TicketKey,
        #[source]
        source: ApiError,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    error::Error,
    fmt::{Display, Formatter},
    str::FromStr,
    time::Duration,
};

/// Key of a ticket in the issue tracker, e.g. `KAN-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketKey(String);

impl TicketKey {
    pub fn new(key: impl Into<String>) -> Result<Self, EmptyTicketKey> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(EmptyTicketKey);
        }
        Ok(TicketKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TicketKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TicketKey {
    type Err = EmptyTicketKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketKey::new(s)
    }
}

impl TryFrom<String> for TicketKey {
    type Error = EmptyTicketKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TicketKey::new(value)
    }
}

impl From<TicketKey> for String {
    fn from(key: TicketKey) -> Self {
        key.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EmptyTicketKey;

impl Display for EmptyTicketKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ticket key must not be empty")
    }
}

impl Error for EmptyTicketKey {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pass,
    Fail,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Status::Pass => "PASS",
                Status::Fail => "FAIL",
            }
        )
    }
}

/// What went wrong in a failed test: the error's type and its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub type_name: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorDetail {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Captures `error` with the unqualified name of `E` as its type.
    pub fn of<E: Display>(error: &E) -> Self {
        ErrorDetail::new(
            short_type_name(std::any::type_name::<E>()),
            error.to_string(),
        )
    }
}

/// `std::io::error::Error` -> `Error`, `Vec<alloc::string::String>` -> `Vec`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// The result of one test invocation, consumed once to build a report comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub ticket: TicketKey,
    pub test_name: String,
    pub status: Status,
    pub duration: Duration,
    pub error: Option<ErrorDetail>,
    pub timestamp: DateTime<Local>,
}

impl Outcome {
    pub fn passed(ticket: TicketKey, test_name: impl Into<String>, duration: Duration) -> Self {
        Outcome {
            ticket,
            test_name: test_name.into(),
            status: Status::Pass,
            duration,
            error: None,
            timestamp: Local::now(),
        }
    }

    pub fn failed(
        ticket: TicketKey,
        test_name: impl Into<String>,
        duration: Duration,
        error: ErrorDetail,
    ) -> Self {
        Outcome {
            ticket,
            test_name: test_name.into(),
            status: Status::Fail,
            duration,
            error: Some(error),
            timestamp: Local::now(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

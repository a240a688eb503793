use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle state of a patch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Reviewed,
    Accepted,
    Closed,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Reviewed => "reviewed",
            Status::Accepted => "accepted",
            Status::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "open" => Some(Status::Open),
            "reviewed" => Some(Status::Reviewed),
            "accepted" => Some(Status::Accepted),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }

    /// All transitions between distinct states are permitted; a transition to
    /// the current state fails.
    pub fn transition_to(self, next: Status) -> Result<Status> {
        if self == next {
            return Err(Error::AlreadyInState(next));
        }
        Ok(next)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

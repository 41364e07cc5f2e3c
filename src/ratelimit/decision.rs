//! Outcome of an admission check.

use std::time::Duration;

use crate::error::TollgateError;

/// Whether a request may proceed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// The request was recorded and may proceed.
    Admit,
    /// The client is over its quota; nothing was recorded.
    Reject {
        /// Time until a slot frees up
        wait: Duration,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit)
    }

    /// The advertised wait, if the request was rejected.
    pub fn wait(&self) -> Option<Duration> {
        match self {
            Decision::Admit => None,
            Decision::Reject { wait } => Some(*wait),
        }
    }

    /// Convert into a `Result`, mapping a rejection to
    /// [`TollgateError::RateLimited`].
    pub fn into_result(self) -> Result<(), TollgateError> {
        match self {
            Decision::Admit => Ok(()),
            Decision::Reject { wait } => Err(TollgateError::RateLimited { wait }),
        }
    }

    /// Human-readable retry hint for a rejection.
    pub fn retry_message(&self) -> Option<String> {
        self.into_result().err().map(|e| e.to_string())
    }
}

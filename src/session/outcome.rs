//! Three-way outcome for operations whose failures may be absorbed

use std::fmt;

/// What was done to absorb a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The session was torn down
    Disconnected,
    /// The step was skipped and bring-up carried on
    Skipped,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recovery::Disconnected => write!(f, "session disconnected"),
            Recovery::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of a session operation.
///
/// Command writes only ever yield `Ok` or `Recovered`: a failed write tears
/// the session down and is not reported as an error. `Fatal` is reserved for
/// bring-up steps and surfaces as an `Err` from `connect`.
#[derive(Debug)]
pub enum Outcome<T = ()> {
    /// Step succeeded
    Ok(T),
    /// Step failed; the failure was absorbed after applying `recovery`
    Recovered {
        error: anyhow::Error,
        recovery: Recovery,
    },
    /// Step failed and the enclosing operation must fail
    Fatal(anyhow::Error),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Outcome::Recovered { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }

    /// Collapse into a `Result`, with recovered failures mapped to `None`
    pub fn into_result(self) -> anyhow::Result<Option<T>> {
        match self {
            Outcome::Ok(value) => Ok(Some(value)),
            Outcome::Recovered { .. } => Ok(None),
            Outcome::Fatal(e) => Err(e),
        }
    }
}

impl<T> From<anyhow::Result<T>> for Outcome<T> {
    /// Errors without a recovery path are fatal
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::Fatal(e),
        }
    }
}

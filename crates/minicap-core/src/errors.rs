use thiserror::Error;

use crate::status::Status;

/// Failure of a resolver or capture-session operation.
///
/// Every variant maps to a compositor [`Status`]; nothing here is retried
/// internally, the caller decides whether to try again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Unable to get handle for display {display_id}: {status}")]
    Resolution { display_id: i32, status: Status },

    #[error("{call}() failed: {status}")]
    Query { call: &'static str, status: Status },

    #[error("Active config {index} not inside configs (size {count})")]
    Index { index: i32, count: usize },

    #[error("Screenshot failed: {status}")]
    Capture { status: Status },

    #[error("Session for display {display_id} has been released")]
    Released { display_id: i32 },
}

impl CaptureError {
    /// Status code reported for this error.
    pub fn status(&self) -> Status {
        match self {
            Self::Resolution { status, .. }
            | Self::Query { status, .. }
            | Self::Capture { status } => *status,
            Self::Index { .. } => Status::BAD_VALUE,
            Self::Released { .. } => Status::INVALID_OPERATION,
        }
    }
}

use thiserror::Error;

/// Failures raised by capability handlers (tools and resource reads).
///
/// The dispatcher converts every variant into a JSON-RPC `-32603` error
/// carrying only the textual message, never a backtrace.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { message: String },
    #[error("{message}")]
    Internal { message: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

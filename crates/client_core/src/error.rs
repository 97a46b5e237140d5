use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiCallError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status} ({code:?})")]
    Rejected { status: u16, code: ErrorCode },
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}

impl ApiCallError {
    pub fn rejected(status: u16) -> Self {
        Self::Rejected {
            status,
            code: ErrorCode::from_status(status),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no relationship action staged; refresh the status first")]
    NoActionStaged,
    #[error("relationship controls were removed for this profile")]
    RegionRemoved,
    #[error("an invitation can only be rejected while one addressed to you is pending")]
    RejectUnavailable,
    #[error("a relationship action is already in flight")]
    ActionInFlight,
    #[error("relationship status unavailable: {0}")]
    StatusUnavailable(#[source] ApiCallError),
    #[error("profile unavailable: {0}")]
    ProfileUnavailable(#[source] ApiCallError),
}

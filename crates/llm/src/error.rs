use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for docqa_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(d) => docqa_core::Error::ExternalTimeout(format!("{d:?}")),
            other => docqa_core::Error::ExternalUnavailable(other.to_string()),
        }
    }
}

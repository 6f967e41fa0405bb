#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API answered 401. The local session has already been cleared.
    #[error("unauthorized")]
    Unauthorized,
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

use serde::Serialize;

/// Toast-style feedback for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Success { title: String, message: String },
    Error { title: String, message: String },
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Success {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Error {
            title: title.into(),
            message: message.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Notification::Success { message, .. } | Notification::Error { message, .. } => message,
        }
    }
}

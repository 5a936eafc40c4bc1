use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status, absent for transport failures (timeouts, refused connections).
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.status.is_none()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Index {index} out of bounds (len {len})")]
    Index { index: usize, len: usize },

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid state: {0}")]
    State(String),
}

impl Error {
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation(ValidationError::new(field, reason))
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Error::State(msg.into())
    }

    /// Only validation and remote failures are shown to the user; everything
    /// else is an internal fault that gets logged.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Remote(_))
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation(e) => Some(&e.field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visibility() {
        assert!(Error::validation("period", "too small").is_user_visible());
        assert!(Error::Remote(RemoteError::new(Some(500), "boom")).is_user_visible());
        assert!(!Error::parse("eof").is_user_visible());
        assert!(!Error::schema("unknown tag").is_user_visible());
        assert!(!Error::Index { index: 3, len: 1 }.is_user_visible());
    }

    #[test]
    fn test_display() {
        let err = Error::validation("fixedBuyPercentage", "must be in (0, 1]");
        assert_eq!(err.to_string(), "invalid fixedBuyPercentage: must be in (0, 1]");
        assert_eq!(err.field(), Some("fixedBuyPercentage"));

        let remote = RemoteError::new(Some(400), "Bad strategy");
        assert_eq!(Error::from(remote).to_string(), "Remote error: Bad strategy");
    }
}

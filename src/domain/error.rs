use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown category `{name}`")]
    UnknownCategory { name: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn unknown_category(name: impl Into<String>) -> Self {
        Self::UnknownCategory { name: name.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

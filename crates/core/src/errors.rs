use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CounterError {
    #[error("no data for counter `{key}`")]
    NotFound { key: String },
    #[error("counter store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("counter `{key}` holds a malformed value `{value}`")]
    MalformedValue { key: String, value: String },
    #[error("counter `{key}` is at its maximum value")]
    Overflow { key: String },
}

impl CounterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

/// The counter page has no retry semantics, so every store failure reaches the
/// caller as a bad request carrying the store's own error text.
impl From<CounterError> for InterfaceError {
    fn from(value: CounterError) -> Self {
        Self::BadRequest { message: value.to_string(), correlation_id: "unassigned".to_owned() }
    }
}

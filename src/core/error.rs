use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlowupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u32 },

    #[error("Invalid subscription tier: {0}")]
    InvalidTier(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Unknown preference: {0}")]
    UnknownPreference(String),

    #[error("Unknown profile field: {0}")]
    UnknownProfileField(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GlowupError {
    pub(crate) fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        GlowupError::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GlowupError>;

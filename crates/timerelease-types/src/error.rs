use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypesError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Other error: {0}")]
    Other(String),
}

impl TypesError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        TypesError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

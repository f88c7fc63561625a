use thiserror::Error;

/// Errors produced by misused formatter builders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("end called with no matching begin")]
    UnbalancedEnd,

    #[error("value recorded outside any container")]
    ValueOutsideDocument,

    #[error("object member recorded without a member name")]
    MissingMemberName,

    #[error("member name recorded outside an object")]
    NameOutsideObject,

    #[error("generate called on an incomplete document")]
    IncompleteDocument,

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type FormatResult<T> = Result<T, FormatError>;

impl From<FormatError> for streamd_types::ControlError {
    fn from(err: FormatError) -> Self {
        // A builder misuse is an internal defect; it surfaces as a failed
        // command rather than crashing the response path.
        streamd_types::ControlError::BadCommand(format!("render failed: {err}"))
    }
}

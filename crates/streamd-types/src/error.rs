use thiserror::Error;

use crate::code::ReturnCode;

/// Error form of the return-code taxonomy.
///
/// Operations across the object tree, parser, and IPC layers all return
/// this type; there is no out-of-band error channel. The context strings
/// feed log lines only; the wire carries [`ReturnCode`] and its fixed
/// description.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("required argument is null")]
    NullArgument,

    #[error("bad command: {0}")]
    BadCommand(String),

    #[error("no such resource: {0}")]
    NoResource(String),

    #[error("resource already exists: {0}")]
    ExistingResource(String),

    #[error("bad value: {0}")]
    BadValue(String),

    #[error("no connection: {0}")]
    NoConnection(String),

    #[error("operation completed with no state change")]
    NoUpdate,

    #[error("operation timed out")]
    Timeout,
}

impl ControlError {
    /// The wire code for this error.
    pub fn code(&self) -> ReturnCode {
        match self {
            Self::NullArgument => ReturnCode::NullArgument,
            Self::BadCommand(_) => ReturnCode::BadCommand,
            Self::NoResource(_) => ReturnCode::NoResource,
            Self::ExistingResource(_) => ReturnCode::ExistingResource,
            Self::BadValue(_) => ReturnCode::BadValue,
            Self::NoConnection(_) => ReturnCode::NoConnection,
            Self::NoUpdate => ReturnCode::NoUpdate,
            Self::Timeout => ReturnCode::Timeout,
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_to_code() {
        assert_eq!(ControlError::NullArgument.code(), ReturnCode::NullArgument);
        assert_eq!(
            ControlError::BadCommand("nope".into()).code(),
            ReturnCode::BadCommand
        );
        assert_eq!(
            ControlError::NoResource("/pipelines/x".into()).code(),
            ReturnCode::NoResource
        );
        assert_eq!(
            ControlError::ExistingResource("p0".into()).code(),
            ReturnCode::ExistingResource
        );
        assert_eq!(
            ControlError::BadValue("flying".into()).code(),
            ReturnCode::BadValue
        );
        assert_eq!(ControlError::NoUpdate.code(), ReturnCode::NoUpdate);
        assert_eq!(ControlError::Timeout.code(), ReturnCode::Timeout);
    }

    #[test]
    fn display_carries_context() {
        let err = ControlError::NoResource("/pipelines/ghost".into());
        assert_eq!(err.to_string(), "no such resource: /pipelines/ghost");
    }
}

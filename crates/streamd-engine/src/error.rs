use thiserror::Error;

use streamd_types::ControlError;

/// Errors produced by engine backends.
///
/// These never reach the wire directly: [`ControlError::from`] is the single
/// translation point onto the daemon's return-code taxonomy.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("description parse error: {0}")]
    Parse(String),

    #[error("no such element factory: {0}")]
    UnknownFactory(String),

    #[error("no such property: {0}")]
    NoSuchProperty(String),

    #[error("no such signal: {0}")]
    NoSuchSignal(String),

    #[error("property is not writable: {0}")]
    ReadOnlyProperty(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("state change rejected: {0}")]
    StateChange(String),

    /// The element graph mutated mid-iteration; the caller should restart
    /// the iteration.
    #[error("iteration must resync")]
    Resync,

    #[error("operation timed out")]
    Timeout,

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for ControlError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Parse(msg) => ControlError::BadCommand(msg),
            EngineError::UnknownFactory(name) => {
                ControlError::BadCommand(format!("no such element factory: {name}"))
            }
            EngineError::NoSuchProperty(name) => {
                ControlError::NoResource(format!("no such property: {name}"))
            }
            EngineError::NoSuchSignal(name) => {
                ControlError::NoResource(format!("no such signal: {name}"))
            }
            EngineError::ReadOnlyProperty(name) => {
                ControlError::BadValue(format!("property is not writable: {name}"))
            }
            EngineError::InvalidValue(msg) => ControlError::BadValue(msg),
            EngineError::StateChange(msg) => ControlError::BadValue(msg),
            EngineError::Resync => ControlError::BadCommand("iteration must resync".into()),
            EngineError::Backend(msg) => ControlError::BadCommand(format!("backend failure: {msg}")),
            EngineError::Timeout => ControlError::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamd_types::ReturnCode;

    #[test]
    fn taxonomy_translation() {
        let cases = [
            (EngineError::Parse("x".into()), ReturnCode::BadCommand),
            (
                EngineError::UnknownFactory("x".into()),
                ReturnCode::BadCommand,
            ),
            (
                EngineError::NoSuchProperty("x".into()),
                ReturnCode::NoResource,
            ),
            (EngineError::NoSuchSignal("x".into()), ReturnCode::NoResource),
            (
                EngineError::ReadOnlyProperty("x".into()),
                ReturnCode::BadValue,
            ),
            (EngineError::InvalidValue("x".into()), ReturnCode::BadValue),
            (EngineError::StateChange("x".into()), ReturnCode::BadValue),
            (EngineError::Timeout, ReturnCode::Timeout),
            (EngineError::Backend("x".into()), ReturnCode::BadCommand),
        ];
        for (engine_err, expected) in cases {
            assert_eq!(ControlError::from(engine_err).code(), expected);
        }
    }
}

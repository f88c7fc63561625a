use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// The four externally visible pipeline states.
///
/// The text forms are part of the command protocol (`update …/state playing`)
/// and of rendered views; parsing is case-sensitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    #[default]
    Null,
    Ready,
    Paused,
    Playing,
}

impl PipelineState {
    /// The canonical text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Ready => "ready",
            Self::Paused => "paused",
            Self::Playing => "playing",
        }
    }

    /// States that hold a play reference on their pipeline.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Paused | Self::Playing)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineState {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(Self::Null),
            "ready" => Ok(Self::Ready),
            "paused" => Ok(Self::Paused),
            "playing" => Ok(Self::Playing),
            other => Err(ControlError::BadValue(format!(
                "unknown pipeline state: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_text_forms() {
        for state in [
            PipelineState::Null,
            PipelineState::Ready,
            PipelineState::Paused,
            PipelineState::Playing,
        ] {
            assert_eq!(state.as_str().parse::<PipelineState>().unwrap(), state);
        }
    }

    #[test]
    fn reject_unknown_state() {
        let err = "flying".parse::<PipelineState>().unwrap_err();
        assert!(matches!(err, ControlError::BadValue(_)));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Playing".parse::<PipelineState>().is_err());
        assert!("NULL".parse::<PipelineState>().is_err());
    }

    #[test]
    fn active_states() {
        assert!(!PipelineState::Null.is_active());
        assert!(!PipelineState::Ready.is_active());
        assert!(PipelineState::Paused.is_active());
        assert!(PipelineState::Playing.is_active());
    }

    #[test]
    fn default_is_null() {
        assert_eq!(PipelineState::default(), PipelineState::Null);
    }
}

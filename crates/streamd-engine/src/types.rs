use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{EngineError, EngineResult};

/// Scalar kinds a property, signal argument, or action return may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    Int,
    UInt,
    Int64,
    UInt64,
    Bool,
    Float,
    Double,
    /// Opaque enumeration, carried as its string nick.
    Enum,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Double => "double",
            Self::Enum => "enum",
        }
    }
}

/// A typed property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i32),
    UInt(u32),
    Int64(i64),
    UInt64(u64),
    Bool(bool),
    Float(f32),
    Double(f64),
    Enum(String),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Int(_) => ValueKind::Int,
            Self::UInt(_) => ValueKind::UInt,
            Self::Int64(_) => ValueKind::Int64,
            Self::UInt64(_) => ValueKind::UInt64,
            Self::Bool(_) => ValueKind::Bool,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Enum(_) => ValueKind::Enum,
        }
    }

    /// Parse a command-line token as a value of the given kind.
    pub fn parse(kind: ValueKind, token: &str) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidValue(format!("{token:?} is not a valid {}", kind.as_str()));
        match kind {
            ValueKind::String => Ok(Self::String(token.to_string())),
            ValueKind::Enum => Ok(Self::Enum(token.to_string())),
            ValueKind::Int => token.parse().map(Self::Int).map_err(|_| invalid()),
            ValueKind::UInt => token.parse().map(Self::UInt).map_err(|_| invalid()),
            ValueKind::Int64 => token.parse().map(Self::Int64).map_err(|_| invalid()),
            ValueKind::UInt64 => token.parse().map(Self::UInt64).map_err(|_| invalid()),
            ValueKind::Bool => match token {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            ValueKind::Float => token.parse().map(Self::Float).map_err(|_| invalid()),
            ValueKind::Double => token.parse().map(Self::Double).map_err(|_| invalid()),
        }
    }

    /// JSON form used in rendered views.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) | Self::Enum(s) => json!(s),
            Self::Int(v) => json!(v),
            Self::UInt(v) => json!(v),
            Self::Int64(v) => json!(v),
            Self::UInt64(v) => json!(v),
            Self::Bool(v) => json!(v),
            Self::Float(v) => json!(v),
            Self::Double(v) => json!(v),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Enum(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

/// Access rights on a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "readwrite",
        }
    }

    pub fn is_readable(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Introspected description of one element property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySchema {
    pub name: String,
    pub description: String,
    pub kind: ValueKind,
    pub access: Access,
    pub default: PropertyValue,
}

/// Introspected description of one signal or action.
///
/// Actions are signals a client may emit; the schema shape is shared.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalSchema {
    pub name: String,
    pub arguments: Vec<ValueKind>,
    pub return_type: Option<ValueKind>,
}

/// Bus message categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Eos,
    StateChanged,
    Qos,
}

impl MessageType {
    pub const ALL: [MessageType; 6] = [
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Eos,
        Self::StateChanged,
        Self::Qos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Eos => "eos",
            Self::StateChanged => "state-changed",
            Self::Qos => "qos",
        }
    }

    pub fn parse(token: &str) -> EngineResult<Self> {
        match token {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "eos" => Ok(Self::Eos),
            "state-changed" => Ok(Self::StateChanged),
            "qos" => Ok(Self::Qos),
            other => Err(EngineError::InvalidValue(format!(
                "unknown message type: {other:?}"
            ))),
        }
    }
}

/// Which message types a bus read lets through.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageFilter {
    types: Vec<MessageType>,
}

impl MessageFilter {
    /// Parse a `+`-separated list of type names, e.g. `error+eos+warning`.
    pub fn parse(spec: &str) -> EngineResult<Self> {
        if spec.is_empty() {
            return Err(EngineError::InvalidValue("empty message filter".into()));
        }
        let mut types = Vec::new();
        for token in spec.split('+') {
            let ty = MessageType::parse(token)?;
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        Ok(Self { types })
    }

    pub fn accepts(&self, ty: MessageType) -> bool {
        self.types.contains(&ty)
    }
}

impl Default for MessageFilter {
    /// All message types pass.
    fn default() -> Self {
        Self {
            types: MessageType::ALL.to_vec(),
        }
    }
}

impl fmt::Display for MessageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types.iter().map(|t| t.as_str()).collect();
        f.write_str(&names.join("+"))
    }
}

/// One message popped from a pipeline bus.
#[derive(Clone, Debug, PartialEq)]
pub struct BusMessage {
    pub kind: MessageType,
    pub source: String,
    pub payload: Value,
}

impl BusMessage {
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.kind.as_str(),
            "source": self.source,
            "payload": self.payload,
        })
    }
}

/// How a state change completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateChange {
    Sync,
    Async,
}

/// Outcome of a bounded state query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateChangeResult {
    Ok,
    Async,
    Failed,
}

/// Events a client may post on a pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    Eos,
    FlushStart,
    FlushStop,
    Seek {
        rate: f64,
        start: Option<u64>,
        stop: Option<u64>,
    },
}

/// Backend-wide debug controls.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugSettings {
    pub enabled: bool,
    pub color: bool,
    pub threshold: String,
}

impl DebugSettings {
    pub const DEFAULT_THRESHOLD: &'static str = "warning";
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: true,
            threshold: Self::DEFAULT_THRESHOLD.to_string(),
        }
    }
}

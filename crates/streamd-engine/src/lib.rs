//! Engine adapter boundary.
//!
//! The daemon core never talks to a multimedia backend directly; it goes
//! through the [`Engine`], [`EnginePipeline`], and [`EngineElement`] traits
//! defined here. Adapter calls may block up to a caller-supplied timeout and
//! are thread-safe per handle. Backend failures are [`EngineError`] and are
//! translated to the wire taxonomy at this boundary, nowhere else.
//!
//! The crate ships one backend, [`SimEngine`], which executes pipeline
//! descriptions against a fixed element registry without any external
//! dependency. Real backends implement the same traits.

pub mod error;
pub mod sim;
pub mod traits;
pub mod types;

pub use error::{EngineError, EngineResult};
pub use sim::SimEngine;
pub use traits::{Engine, EngineElement, EnginePipeline, MAX_RESYNC_RETRIES};
pub use types::{
    Access, BusMessage, DebugSettings, MessageFilter, MessageType, PipelineEvent, PropertySchema,
    PropertyValue, SignalSchema, StateChange, StateChangeResult, ValueKind,
};

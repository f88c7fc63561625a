use std::sync::Arc;
use std::time::Duration;

use streamd_types::PipelineState;

use crate::error::EngineResult;
use crate::types::{
    BusMessage, DebugSettings, MessageFilter, PipelineEvent, PropertySchema, PropertyValue,
    SignalSchema, StateChange, StateChangeResult,
};

/// How many times an element iteration is restarted on
/// [`EngineError::Resync`](crate::EngineError::Resync) before the caller
/// treats it as fatal.
pub const MAX_RESYNC_RETRIES: u32 = 10;

/// Entry point into a multimedia backend.
///
/// All implementations must satisfy these contracts:
/// - Calls are thread-safe; handles returned are thread-safe per handle.
/// - Any call may block, but never longer than a caller-supplied timeout.
/// - Dropping the last reference to a pipeline handle releases every
///   backend resource behind it.
pub trait Engine: Send + Sync {
    /// Parse a textual pipeline description and construct the graph.
    fn build_pipeline(
        &self,
        name: &str,
        description: &str,
    ) -> EngineResult<Arc<dyn EnginePipeline>>;

    /// Apply backend-wide debug controls.
    fn set_debug(&self, settings: DebugSettings);

    /// Current debug controls.
    fn debug(&self) -> DebugSettings;
}

/// A constructed pipeline graph.
pub trait EnginePipeline: Send + Sync {
    /// Request a state transition. `Async` means the transition continues in
    /// the background and must be observed via [`query_state`].
    ///
    /// [`query_state`]: EnginePipeline::query_state
    fn set_state(&self, state: PipelineState) -> EngineResult<StateChange>;

    /// Query the current and pending state, blocking up to `timeout`.
    /// A pending state of `None` means no transition is in flight.
    fn query_state(
        &self,
        timeout: Duration,
    ) -> (PipelineState, Option<PipelineState>, StateChangeResult);

    /// Snapshot the element graph.
    ///
    /// May return [`EngineError::Resync`](crate::EngineError::Resync) if the
    /// graph mutated mid-iteration; callers retry up to
    /// [`MAX_RESYNC_RETRIES`] times.
    fn iterate_elements(&self) -> EngineResult<Vec<Arc<dyn EngineElement>>>;

    /// Post an event into the pipeline.
    fn post_event(&self, event: PipelineEvent) -> EngineResult<()>;

    /// Pop the next bus message matching `filter`, waiting up to `timeout`
    /// (`None` waits indefinitely). Returns `None` on expiry.
    fn bus_pop(&self, timeout: Option<Duration>, filter: &MessageFilter) -> Option<BusMessage>;
}

impl std::fmt::Debug for dyn EnginePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePipeline").finish_non_exhaustive()
    }
}

/// One element inside a pipeline graph.
pub trait EngineElement: Send + Sync {
    fn name(&self) -> String;

    /// The factory (element type) name this element was built from.
    fn factory(&self) -> String;

    fn list_properties(&self) -> Vec<PropertySchema>;

    fn property_schema(&self, name: &str) -> Option<PropertySchema>;

    fn get_property(&self, name: &str) -> EngineResult<PropertyValue>;

    /// Parse `value` per the property's declared kind and install it.
    fn set_property(&self, name: &str, value: &str) -> EngineResult<()>;

    fn list_signals(&self) -> Vec<SignalSchema>;

    fn list_actions(&self) -> Vec<SignalSchema>;

    /// Emit an action with textual arguments converted per its schema.
    /// Returns the action's return value when it declares one.
    fn emit_action(&self, name: &str, args: &[&str]) -> EngineResult<Option<PropertyValue>>;

    /// Block until the named signal fires (up to `timeout`; `None` waits
    /// indefinitely) and return the emission's arguments.
    fn wait_signal(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> EngineResult<Vec<PropertyValue>>;
}

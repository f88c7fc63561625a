use std::sync::{Arc, Weak};

use streamd_engine::EnginePipeline;
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult, PipelineState};

use crate::node::{describe_value, Node};
use crate::pipeline::{Pipeline, STATE_QUERY_TIMEOUT};

/// The `/pipelines/<p>/state` leaf.
///
/// Reads mirror the engine's state through a bounded query; updates drive
/// transitions through the owning pipeline so the play hold stays balanced.
/// The back-reference to the pipeline is non-owning, which keeps the tree
/// acyclic.
pub struct StateNode {
    pipeline: Weak<Pipeline>,
    handle: Arc<dyn EnginePipeline>,
    factory: Arc<dyn FormatterFactory>,
}

impl StateNode {
    pub(crate) fn new(
        pipeline: Weak<Pipeline>,
        handle: Arc<dyn EnginePipeline>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        Self {
            pipeline,
            handle,
            factory,
        }
    }
}

impl Node for StateNode {
    fn name(&self) -> String {
        "state".to_string()
    }

    fn kind(&self) -> &'static str {
        "state"
    }

    fn update(&self, value: &str) -> ControlResult<Option<String>> {
        let target: PipelineState = value.parse()?;
        let pipeline = self
            .pipeline
            .upgrade()
            .ok_or_else(|| ControlError::NoResource("pipeline is gone".into()))?;
        pipeline.transition(target)?;
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let (current, _, _) = self.handle.query_state(STATE_QUERY_TIMEOUT);
        describe_value(fmt, "state", current.as_str().into())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

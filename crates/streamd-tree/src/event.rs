use std::sync::Arc;

use tracing::debug;

use streamd_engine::{EnginePipeline, PipelineEvent};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

use crate::node::{describe_container, Node};

const EVENT_NAMES: [&str; 4] = ["eos", "flush_start", "flush_stop", "seek"];

/// The `/pipelines/<p>/event` factory.
///
/// `create <event> [args…]` posts the named event into the pipeline. `seek`
/// takes `rate [start stop]`; the flush events accept both underscore and
/// dash spellings.
pub struct EventFactory {
    handle: Arc<dyn EnginePipeline>,
    factory: Arc<dyn FormatterFactory>,
}

impl EventFactory {
    pub(crate) fn new(
        handle: Arc<dyn EnginePipeline>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        Self { handle, factory }
    }

    fn parse_seek(description: &str) -> ControlResult<PipelineEvent> {
        let mut tokens = description.split_whitespace();
        let rate = match tokens.next() {
            None => 1.0,
            Some(token) => token
                .parse()
                .map_err(|_| ControlError::BadValue(format!("{token:?} is not a seek rate")))?,
        };
        let mut position = |label: &str| -> ControlResult<Option<u64>> {
            match tokens.next() {
                None => Ok(None),
                Some(token) => token.parse().map(Some).map_err(|_| {
                    ControlError::BadValue(format!("{token:?} is not a seek {label}"))
                }),
            }
        };
        let start = position("start")?;
        let stop = position("stop")?;
        Ok(PipelineEvent::Seek { rate, start, stop })
    }
}

impl Node for EventFactory {
    fn name(&self) -> String {
        "event".to_string()
    }

    fn kind(&self) -> &'static str {
        "event"
    }

    fn create(&self, name: &str, description: &str) -> ControlResult<Option<String>> {
        let event = match name {
            "eos" => PipelineEvent::Eos,
            "flush_start" | "flush-start" => PipelineEvent::FlushStart,
            "flush_stop" | "flush-stop" => PipelineEvent::FlushStop,
            "seek" => Self::parse_seek(description)?,
            other => {
                return Err(ControlError::BadCommand(format!(
                    "unknown event type: {other:?}"
                )))
            }
        };
        self.handle.post_event(event)?;
        debug!(event = name, "event posted");
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = EVENT_NAMES
            .iter()
            .map(|n| (n.to_string(), String::new()))
            .collect();
        describe_container(fmt, "event", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

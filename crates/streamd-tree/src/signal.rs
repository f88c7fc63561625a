use std::sync::{Arc, Mutex};
use std::time::Duration;

use streamd_engine::{EngineElement, SignalSchema};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

use crate::node::{describe_container, describe_value, Node};

/// Milliseconds; `-1` waits indefinitely.
const DEFAULT_SIGNAL_TIMEOUT_MS: i64 = -1;

/// The `…/signals` container of one element.
pub struct Signals {
    factory: Arc<dyn FormatterFactory>,
    children: Vec<Arc<SignalNode>>,
}

impl Signals {
    pub(crate) fn new(
        element: Arc<dyn EngineElement>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        let children = element
            .list_signals()
            .into_iter()
            .map(|schema| Arc::new(SignalNode::new(element.clone(), schema, factory.clone())))
            .collect();
        Self { factory, children }
    }
}

impl Node for Signals {
    fn name(&self) -> String {
        "signals".to_string()
    }

    fn kind(&self) -> &'static str {
        "signals"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(self
            .children
            .iter()
            .find(|s| s.schema.name == name)
            .map(|s| s.clone() as Arc<dyn Node>))
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = self
            .children
            .iter()
            .map(|s| (s.schema.name.clone(), String::new()))
            .collect();
        describe_container(fmt, "signals", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// One signal of one element.
///
/// Reading the node waits for the next emission (up to the configured
/// timeout) and renders the emission's arguments; the `timeout` child
/// configures the wait in milliseconds.
pub struct SignalNode {
    element: Arc<dyn EngineElement>,
    schema: SignalSchema,
    timeout_ms: Arc<Mutex<i64>>,
    timeout_child: Arc<SignalTimeoutNode>,
    factory: Arc<dyn FormatterFactory>,
}

impl SignalNode {
    fn new(
        element: Arc<dyn EngineElement>,
        schema: SignalSchema,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        let timeout_ms = Arc::new(Mutex::new(DEFAULT_SIGNAL_TIMEOUT_MS));
        let timeout_child = Arc::new(SignalTimeoutNode {
            timeout_ms: timeout_ms.clone(),
            factory: factory.clone(),
        });
        Self {
            element,
            schema,
            timeout_ms,
            timeout_child,
            factory,
        }
    }
}

impl Node for SignalNode {
    fn name(&self) -> String {
        self.schema.name.clone()
    }

    fn kind(&self) -> &'static str {
        "signal"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(match name {
            "timeout" => Some(self.timeout_child.clone() as Arc<dyn Node>),
            _ => None,
        })
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let timeout = *self.timeout_ms.lock().expect("lock poisoned");
        let timeout = if timeout < 0 {
            None
        } else {
            Some(Duration::from_millis(timeout as u64))
        };
        let arguments = self.element.wait_signal(&self.schema.name, timeout)?;

        fmt.begin_object()?;
        fmt.set_member_name("name")?;
        fmt.set_string(&self.schema.name)?;
        fmt.set_member_name("arguments")?;
        fmt.begin_array()?;
        for argument in &arguments {
            fmt.set_json(argument.to_json())?;
        }
        fmt.end_array()?;
        fmt.end_object()?;
        Ok(())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// The `timeout` leaf under a signal, in milliseconds.
pub struct SignalTimeoutNode {
    timeout_ms: Arc<Mutex<i64>>,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for SignalTimeoutNode {
    fn name(&self) -> String {
        "timeout".to_string()
    }

    fn kind(&self) -> &'static str {
        "signal-timeout"
    }

    fn update(&self, value: &str) -> ControlResult<Option<String>> {
        let parsed: i64 = value
            .parse()
            .map_err(|_| ControlError::BadValue(format!("{value:?} is not a timeout")))?;
        if parsed < -1 {
            return Err(ControlError::BadValue(
                "timeout must be -1 or a millisecond count".into(),
            ));
        }
        *self.timeout_ms.lock().expect("lock poisoned") = parsed;
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let timeout = *self.timeout_ms.lock().expect("lock poisoned");
        describe_value(fmt, "timeout", timeout.into())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use streamd_engine::{EnginePipeline, MessageFilter};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

use crate::node::{describe_container, describe_value, Node};

/// Milliseconds; `-1` waits indefinitely.
const DEFAULT_BUS_TIMEOUT_MS: i64 = -1;

struct BusSettings {
    timeout_ms: Mutex<i64>,
    filter: Mutex<MessageFilter>,
}

/// The `/pipelines/<p>/bus` node.
///
/// Three leaf children: `message` pops the next pending message matching
/// the filter (blocking up to the configured timeout), `timeout` and
/// `types` configure the read.
pub struct BusNode {
    factory: Arc<dyn FormatterFactory>,
    message: Arc<BusMessageNode>,
    timeout: Arc<BusTimeoutNode>,
    types: Arc<BusTypesNode>,
}

impl BusNode {
    pub(crate) fn new(
        handle: Arc<dyn EnginePipeline>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        let settings = Arc::new(BusSettings {
            timeout_ms: Mutex::new(DEFAULT_BUS_TIMEOUT_MS),
            filter: Mutex::new(MessageFilter::default()),
        });
        Self {
            message: Arc::new(BusMessageNode {
                handle,
                settings: settings.clone(),
                factory: factory.clone(),
            }),
            timeout: Arc::new(BusTimeoutNode {
                settings: settings.clone(),
                factory: factory.clone(),
            }),
            types: Arc::new(BusTypesNode {
                settings,
                factory: factory.clone(),
            }),
            factory,
        }
    }
}

impl Node for BusNode {
    fn name(&self) -> String {
        "bus".to_string()
    }

    fn kind(&self) -> &'static str {
        "bus"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(match name {
            "message" => Some(self.message.clone() as Arc<dyn Node>),
            "timeout" => Some(self.timeout.clone() as Arc<dyn Node>),
            "types" => Some(self.types.clone() as Arc<dyn Node>),
            _ => None,
        })
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = ["message", "timeout", "types"]
            .iter()
            .map(|n| (n.to_string(), String::new()))
            .collect();
        describe_container(fmt, "bus", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// Pops the next pending bus message.
pub struct BusMessageNode {
    handle: Arc<dyn EnginePipeline>,
    settings: Arc<BusSettings>,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for BusMessageNode {
    fn name(&self) -> String {
        "message".to_string()
    }

    fn kind(&self) -> &'static str {
        "bus-message"
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let timeout_ms = *self.settings.timeout_ms.lock().expect("lock poisoned");
        let timeout = if timeout_ms < 0 {
            None
        } else {
            Some(Duration::from_millis(timeout_ms as u64))
        };
        let filter = self.settings.filter.lock().expect("lock poisoned").clone();
        let message = self
            .handle
            .bus_pop(timeout, &filter)
            .ok_or(ControlError::Timeout)?;
        fmt.set_json(message.to_json())?;
        Ok(())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// The bus read timeout in milliseconds (`-1` waits indefinitely).
pub struct BusTimeoutNode {
    settings: Arc<BusSettings>,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for BusTimeoutNode {
    fn name(&self) -> String {
        "timeout".to_string()
    }

    fn kind(&self) -> &'static str {
        "bus-timeout"
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
        *self.settings.timeout_ms.lock().expect("lock poisoned") = parsed;
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let timeout = *self.settings.timeout_ms.lock().expect("lock poisoned");
        describe_value(fmt, "timeout", timeout.into())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// The message-type filter, a `+`-separated list of type names.
pub struct BusTypesNode {
    settings: Arc<BusSettings>,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for BusTypesNode {
    fn name(&self) -> String {
        "types".to_string()
    }

    fn kind(&self) -> &'static str {
        "bus-types"
    }

    fn update(&self, value: &str) -> ControlResult<Option<String>> {
        let filter = MessageFilter::parse(value)?;
        *self.settings.filter.lock().expect("lock poisoned") = filter;
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let filter = self.settings.filter.lock().expect("lock poisoned").clone();
        describe_value(fmt, "types", filter.to_string().into())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

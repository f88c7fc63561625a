use std::sync::Arc;

use streamd_engine::{DebugSettings, Engine};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

use crate::node::{describe_container, describe_value, Node};

fn parse_bool(value: &str) -> ControlResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ControlError::BadValue(format!(
            "{other:?} is not a boolean"
        ))),
    }
}

/// The `/debug` configuration node, forwarding to the engine's debug
/// controls through four leaves: `enable`, `color`, `threshold`, `reset`.
pub struct DebugNode {
    factory: Arc<dyn FormatterFactory>,
    enable: Arc<DebugLeaf>,
    color: Arc<DebugLeaf>,
    threshold: Arc<DebugLeaf>,
    reset: Arc<DebugLeaf>,
}

impl DebugNode {
    pub(crate) fn new(engine: Arc<dyn Engine>, factory: Arc<dyn FormatterFactory>) -> Self {
        let leaf = |setting: DebugSetting| {
            Arc::new(DebugLeaf {
                engine: engine.clone(),
                setting,
                factory: factory.clone(),
            })
        };
        Self {
            enable: leaf(DebugSetting::Enable),
            color: leaf(DebugSetting::Color),
            threshold: leaf(DebugSetting::Threshold),
            reset: leaf(DebugSetting::Reset),
            factory,
        }
    }
}

impl Node for DebugNode {
    fn name(&self) -> String {
        "debug".to_string()
    }

    fn kind(&self) -> &'static str {
        "debug"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(match name {
            "enable" => Some(self.enable.clone() as Arc<dyn Node>),
            "color" => Some(self.color.clone() as Arc<dyn Node>),
            "threshold" => Some(self.threshold.clone() as Arc<dyn Node>),
            "reset" => Some(self.reset.clone() as Arc<dyn Node>),
            _ => None,
        })
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = ["enable", "color", "threshold", "reset"]
            .iter()
            .map(|n| (n.to_string(), String::new()))
            .collect();
        describe_container(fmt, "debug", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

#[derive(Clone, Copy)]
enum DebugSetting {
    Enable,
    Color,
    Threshold,
    Reset,
}

struct DebugLeaf {
    engine: Arc<dyn Engine>,
    setting: DebugSetting,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for DebugLeaf {
    fn name(&self) -> String {
        match self.setting {
            DebugSetting::Enable => "enable",
            DebugSetting::Color => "color",
            DebugSetting::Threshold => "threshold",
            DebugSetting::Reset => "reset",
        }
        .to_string()
    }

    fn kind(&self) -> &'static str {
        "debug-setting"
    }

    fn update(&self, value: &str) -> ControlResult<Option<String>> {
        let mut settings = self.engine.debug();
        match self.setting {
            DebugSetting::Enable => settings.enabled = parse_bool(value)?,
            DebugSetting::Color => settings.color = parse_bool(value)?,
            DebugSetting::Threshold => {
                if value.is_empty() {
                    return Err(ControlError::BadValue(
                        "threshold must not be empty".into(),
                    ));
                }
                settings.threshold = value.to_string();
            }
            DebugSetting::Reset => {
                if parse_bool(value)? {
                    settings.threshold = DebugSettings::DEFAULT_THRESHOLD.to_string();
                }
            }
        }
        self.engine.set_debug(settings);
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let settings = self.engine.debug();
        let value = match self.setting {
            DebugSetting::Enable => settings.enabled.into(),
            DebugSetting::Color => settings.color.into(),
            DebugSetting::Threshold => settings.threshold.into(),
            DebugSetting::Reset => serde_json::Value::Null,
        };
        describe_value(fmt, &self.name(), value)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

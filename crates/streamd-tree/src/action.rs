use std::sync::Arc;

use tracing::debug;

use streamd_engine::{EngineElement, SignalSchema};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::ControlResult;

use crate::node::{describe_container, Node};

/// The `…/actions` container of one element.
///
/// `create <action> [args…]` emits the named action on the engine element;
/// arguments are converted per the action's parameter schema. Reading a
/// child renders the schema without emitting.
pub struct Actions {
    element: Arc<dyn EngineElement>,
    factory: Arc<dyn FormatterFactory>,
    children: Vec<Arc<ActionNode>>,
}

impl Actions {
    pub(crate) fn new(
        element: Arc<dyn EngineElement>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        let children = element
            .list_actions()
            .into_iter()
            .map(|schema| {
                Arc::new(ActionNode {
                    schema,
                    factory: factory.clone(),
                })
            })
            .collect();
        Self {
            element,
            factory,
            children,
        }
    }
}

impl Node for Actions {
    fn name(&self) -> String {
        "actions".to_string()
    }

    fn kind(&self) -> &'static str {
        "actions"
    }

    fn create(&self, name: &str, description: &str) -> ControlResult<Option<String>> {
        let args: Vec<&str> = description.split_whitespace().collect();
        let returned = self.element.emit_action(name, &args)?;
        debug!(element = %self.element.name(), action = name, "action emitted");
        match returned {
            Some(value) => {
                let mut fmt = self.factory.create();
                fmt.begin_object()?;
                fmt.set_member_name("name")?;
                fmt.set_string(name)?;
                fmt.set_member_name("return")?;
                fmt.set_json(value.to_json())?;
                fmt.end_object()?;
                Ok(Some(fmt.generate()?))
            }
            None => Ok(None),
        }
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(self
            .children
            .iter()
            .find(|a| a.schema.name == name)
            .map(|a| a.clone() as Arc<dyn Node>))
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = self
            .children
            .iter()
            .map(|a| (a.schema.name.clone(), String::new()))
            .collect();
        describe_container(fmt, "actions", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// One callable action, rendered as
/// `{name, arguments: [types…], return: type}`.
pub struct ActionNode {
    schema: SignalSchema,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for ActionNode {
    fn name(&self) -> String {
        self.schema.name.clone()
    }

    fn kind(&self) -> &'static str {
        "action"
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        fmt.begin_object()?;
        fmt.set_member_name("name")?;
        fmt.set_string(&self.schema.name)?;
        fmt.set_member_name("arguments")?;
        fmt.begin_array()?;
        for kind in &self.schema.arguments {
            fmt.set_string(kind.as_str())?;
        }
        fmt.end_array()?;
        fmt.set_member_name("return")?;
        match self.schema.return_type {
            Some(kind) => fmt.set_string(kind.as_str())?,
            None => fmt.set_null()?,
        }
        fmt.end_object()?;
        Ok(())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

use std::sync::Arc;

use streamd_engine::{EngineElement, PropertySchema};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::ControlResult;

use crate::node::{describe_container, Node};

/// The `…/properties` container of one element.
pub struct Properties {
    factory: Arc<dyn FormatterFactory>,
    children: Vec<Arc<PropertyNode>>,
}

impl Properties {
    pub(crate) fn new(
        element: Arc<dyn EngineElement>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        let children = element
            .list_properties()
            .into_iter()
            .map(|schema| {
                Arc::new(PropertyNode {
                    element: element.clone(),
                    schema,
                    factory: factory.clone(),
                })
            })
            .collect();
        Self { factory, children }
    }
}

impl Node for Properties {
    fn name(&self) -> String {
        "properties".to_string()
    }

    fn kind(&self) -> &'static str {
        "properties"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(self
            .children
            .iter()
            .find(|p| p.schema.name == name)
            .map(|p| p.clone() as Arc<dyn Node>))
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = self
            .children
            .iter()
            .map(|p| (p.schema.name.clone(), p.schema.description.clone()))
            .collect();
        describe_container(fmt, "properties", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// A typed property leaf.
///
/// Reads render `{name, value, param: {description, type, access}}`; updates
/// parse the operand per the declared kind and install it through the
/// engine.
pub struct PropertyNode {
    element: Arc<dyn EngineElement>,
    schema: PropertySchema,
    factory: Arc<dyn FormatterFactory>,
}

impl Node for PropertyNode {
    fn name(&self) -> String {
        self.schema.name.clone()
    }

    fn description(&self) -> String {
        self.schema.description.clone()
    }

    fn kind(&self) -> &'static str {
        "property"
    }

    fn update(&self, value: &str) -> ControlResult<Option<String>> {
        self.element.set_property(&self.schema.name, value)?;
        Ok(None)
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let value = self.element.get_property(&self.schema.name)?;
        fmt.begin_object()?;
        fmt.set_member_name("name")?;
        fmt.set_string(&self.schema.name)?;
        fmt.set_member_name("value")?;
        fmt.set_json(value.to_json())?;
        fmt.set_member_name("param")?;
        fmt.begin_object()?;
        fmt.set_member_name("description")?;
        fmt.set_string(&self.schema.description)?;
        fmt.set_member_name("type")?;
        fmt.set_string(self.schema.kind.as_str())?;
        fmt.set_member_name("access")?;
        fmt.set_string(self.schema.access.as_str())?;
        fmt.end_object()?;
        fmt.end_object()?;
        Ok(())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

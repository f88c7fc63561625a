use std::fmt;
use std::sync::{Arc, RwLock};

use streamd_engine::{EngineElement, EngineError, EnginePipeline, MAX_RESYNC_RETRIES};
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

use crate::action::Actions;
use crate::node::{describe_container, Node};
use crate::property::Properties;
use crate::signal::Signals;

/// The `/pipelines/<p>/elements` container.
///
/// Elements are discovered through engine introspection on first use. If
/// the graph mutates mid-iteration the engine signals a resync; the
/// iteration restarts up to [`MAX_RESYNC_RETRIES`] times before the failure
/// is treated as fatal.
pub struct Elements {
    handle: Arc<dyn EnginePipeline>,
    factory: Arc<dyn FormatterFactory>,
    index: RwLock<Option<Vec<Arc<ElementNode>>>>,
}

impl Elements {
    pub(crate) fn new(
        handle: Arc<dyn EnginePipeline>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Self {
        Self {
            handle,
            factory,
            index: RwLock::new(None),
        }
    }

    fn ensure(&self) -> ControlResult<Vec<Arc<ElementNode>>> {
        if let Some(list) = self.index.read().expect("lock poisoned").as_ref() {
            return Ok(list.clone());
        }
        let mut slot = self.index.write().expect("lock poisoned");
        if let Some(list) = slot.as_ref() {
            return Ok(list.clone());
        }

        let mut attempts = 0;
        let discovered = loop {
            match self.handle.iterate_elements() {
                Ok(elements) => break elements,
                Err(EngineError::Resync) if attempts < MAX_RESYNC_RETRIES => {
                    attempts += 1;
                }
                Err(EngineError::Resync) => {
                    return Err(ControlError::BadCommand(
                        "element iteration did not settle".into(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        };

        let nodes: Vec<Arc<ElementNode>> = discovered
            .into_iter()
            .map(|element| Arc::new(ElementNode::new(element, self.factory.clone())))
            .collect();
        *slot = Some(nodes.clone());
        Ok(nodes)
    }
}

impl Node for Elements {
    fn name(&self) -> String {
        "elements".to_string()
    }

    fn kind(&self) -> &'static str {
        "elements"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(self
            .ensure()?
            .into_iter()
            .find(|e| e.name() == name)
            .map(|e| e as Arc<dyn Node>))
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = self
            .ensure()?
            .iter()
            .map(|e| (e.name(), e.description()))
            .collect();
        describe_container(fmt, "elements", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

/// One element inside a pipeline, owning its property, signal, and action
/// containers. The engine handle is non-owning from the element's point of
/// view; the backend graph stays alive through the pipeline.
pub struct ElementNode {
    element: Arc<dyn EngineElement>,
    properties: Arc<Properties>,
    signals: Arc<Signals>,
    actions: Arc<Actions>,
    factory: Arc<dyn FormatterFactory>,
}

impl ElementNode {
    fn new(element: Arc<dyn EngineElement>, factory: Arc<dyn FormatterFactory>) -> Self {
        Self {
            properties: Arc::new(Properties::new(element.clone(), factory.clone())),
            signals: Arc::new(Signals::new(element.clone(), factory.clone())),
            actions: Arc::new(Actions::new(element.clone(), factory.clone())),
            element,
            factory,
        }
    }
}

impl fmt::Debug for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementNode")
            .field("name", &self.element.name())
            .finish()
    }
}

impl Node for ElementNode {
    fn name(&self) -> String {
        self.element.name()
    }

    fn description(&self) -> String {
        self.element.factory()
    }

    fn kind(&self) -> &'static str {
        "element"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(match name {
            "properties" => Some(self.properties.clone() as Arc<dyn Node>),
            "signals" => Some(self.signals.clone() as Arc<dyn Node>),
            "actions" => Some(self.actions.clone() as Arc<dyn Node>),
            _ => None,
        })
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        fmt.begin_object()?;
        fmt.set_member_name("name")?;
        fmt.set_string(&self.element.name())?;
        fmt.set_member_name("factory")?;
        fmt.set_string(&self.element.factory())?;
        fmt.set_member_name("children")?;
        fmt.begin_array()?;
        for child in ["properties", "signals", "actions"] {
            fmt.begin_object()?;
            fmt.set_member_name("name")?;
            fmt.set_string(child)?;
            fmt.end_object()?;
        }
        fmt.end_array()?;
        fmt.end_object()?;
        Ok(())
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

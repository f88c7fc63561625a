use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use streamd_engine::Engine;
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult};

use crate::node::{describe_container, validate_name, Node};
use crate::pipeline::Pipeline;

/// The `/pipelines` container: an ordered, name-indexed collection of live
/// pipelines.
///
/// `create` delegates graph construction to the engine before touching the
/// index, so a failed build leaves no visible side effects. The index lock
/// linearizes concurrent creates and deletes: of two racing creates for the
/// same name exactly one wins, the other gets `ExistingResource`.
pub struct Pipelines {
    engine: Arc<dyn Engine>,
    factory: Arc<dyn FormatterFactory>,
    index: RwLock<Vec<Arc<Pipeline>>>,
}

impl Pipelines {
    pub(crate) fn new(engine: Arc<dyn Engine>, factory: Arc<dyn FormatterFactory>) -> Self {
        Self {
            engine,
            factory,
            index: RwLock::new(Vec::new()),
        }
    }

    /// Look up one pipeline by name.
    pub fn get(&self, name: &str) -> Option<Arc<Pipeline>> {
        self.index
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Snapshot of the collection in creation order. Each entry is a counted
    /// reference, safe to query after the lock is released.
    pub fn list(&self) -> Vec<Arc<Pipeline>> {
        self.index.read().expect("lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.index.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().expect("lock poisoned").is_empty()
    }
}

impl Node for Pipelines {
    fn name(&self) -> String {
        "pipelines".to_string()
    }

    fn kind(&self) -> &'static str {
        "pipelines"
    }

    fn create(&self, name: &str, description: &str) -> ControlResult<Option<String>> {
        validate_name(name)?;
        if description.is_empty() {
            return Err(ControlError::BadValue(
                "pipeline description must not be empty".into(),
            ));
        }
        // Fail fast on an obvious collision before building the graph.
        if self.get(name).is_some() {
            return Err(ControlError::ExistingResource(name.to_string()));
        }

        let handle = self.engine.build_pipeline(name, description).map_err(|e| {
            warn!(pipeline = name, error = %e, "pipeline construction failed");
            ControlError::from(e)
        })?;
        let pipeline = Pipeline::new(name, description, handle, self.factory.clone());

        let mut index = self.index.write().expect("lock poisoned");
        if index.iter().any(|p| p.name() == name) {
            // A racing create won; dropping our node releases the engine
            // graph we just built.
            return Err(ControlError::ExistingResource(name.to_string()));
        }
        index.push(pipeline.clone());
        drop(index);

        info!(pipeline = name, "pipeline created");
        pipeline.render().map(Some)
    }

    fn delete(&self, name: &str) -> ControlResult<()> {
        let pipeline = self
            .get(name)
            .ok_or_else(|| ControlError::NoResource(name.to_string()))?;

        // Hold the pipeline's own lock across the check and the removal so a
        // concurrent play cannot slip between them.
        let hold = pipeline.play_hold_guard();
        if *hold > 0 {
            return Err(ControlError::BadValue(format!(
                "pipeline {name:?} is {}; stop it before deleting",
                pipeline.current_state().as_str()
            )));
        }
        let mut index = self.index.write().expect("lock poisoned");
        index.retain(|p| p.name() != name);
        drop(index);
        drop(hold);

        info!(pipeline = name, "pipeline deleted");
        Ok(())
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(self.get(name).map(|p| p as Arc<dyn Node>))
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children: Vec<(String, String)> = self
            .list()
            .iter()
            .map(|p| (p.name(), p.description()))
            .collect();
        describe_container(fmt, "pipelines", &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

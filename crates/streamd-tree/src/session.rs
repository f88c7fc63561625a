use std::sync::{Arc, Mutex, OnceLock, Weak};

use tracing::info;

use streamd_engine::{Engine, SimEngine};
use streamd_format::{Formatter, FormatterFactory, JsonFactory};
use streamd_types::ControlResult;

use crate::debug::DebugNode;
use crate::node::{describe_container, Node};
use crate::path::resolve;
use crate::pipelines::Pipelines;

fn singleton_slot() -> &'static Mutex<Weak<Session>> {
    static SLOT: OnceLock<Mutex<Weak<Session>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(Weak::new()))
}

/// The root of the object tree.
///
/// A session owns the `/pipelines` and `/debug` sub-trees, the engine, and
/// the formatter factory every node renders through. [`Session::new`] hands
/// out the process-wide singleton: acquisitions while any reference is
/// alive return the same instance, and the slot re-initializes once the
/// last reference drops.
pub struct Session {
    name: String,
    engine: Arc<dyn Engine>,
    factory: Arc<dyn FormatterFactory>,
    pipelines: Arc<Pipelines>,
    debug: Arc<DebugNode>,
    self_ref: Weak<Session>,
}

impl Session {
    /// Acquire the process-wide session, creating it on first call with the
    /// built-in engine.
    pub fn new(name: &str) -> Arc<Self> {
        let mut slot = singleton_slot().lock().expect("lock poisoned");
        if let Some(existing) = slot.upgrade() {
            return existing;
        }
        let session = Self::standalone(name, Arc::new(SimEngine::new()));
        *slot = Arc::downgrade(&session);
        session
    }

    /// Build an independent session around the given engine.
    ///
    /// Used for embedding and tests; the daemon itself runs on the
    /// singleton.
    pub fn standalone(name: &str, engine: Arc<dyn Engine>) -> Arc<Self> {
        let factory: Arc<dyn FormatterFactory> = Arc::new(JsonFactory);
        let session = Arc::new_cyclic(|self_ref| Self {
            name: name.to_string(),
            pipelines: Arc::new(Pipelines::new(engine.clone(), factory.clone())),
            debug: Arc::new(DebugNode::new(engine.clone(), factory.clone())),
            engine,
            factory,
            self_ref: self_ref.clone(),
        });
        info!(session = name, "session initialized");
        session
    }

    pub fn pipelines(&self) -> Arc<Pipelines> {
        self.pipelines.clone()
    }

    pub fn engine(&self) -> Arc<dyn Engine> {
        self.engine.clone()
    }

    /// A counted handle to this session, usable as the resolution root.
    pub fn as_node(&self) -> Arc<dyn Node> {
        // Upgrading cannot fail while a caller holds the session.
        self.self_ref.upgrade().expect("session still referenced")
    }

    /// Resolve an absolute path from this root.
    pub fn resolve(&self, path: &str) -> ControlResult<Arc<dyn Node>> {
        resolve(self.as_node(), path)
    }
}

impl Node for Session {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> &'static str {
        "session"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        Ok(match name {
            "pipelines" => Some(self.pipelines.clone() as Arc<dyn Node>),
            "debug" => Some(self.debug.clone() as Arc<dyn Node>),
            _ => None,
        })
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        let children = [
            ("pipelines".to_string(), String::new()),
            ("debug".to_string(), String::new()),
        ];
        describe_container(fmt, &self.name, &children)
    }

    fn formatter_factory(&self) -> Arc<dyn FormatterFactory> {
        self.factory.clone()
    }
}

//! Built-in simulated backend.
//!
//! [`SimEngine`] executes pipeline descriptions against a fixed element
//! registry with no external dependency. State transitions complete
//! synchronously, bus messages are queued in memory, and `appsink` actions
//! produce synthetic samples. It backs the daemon's default configuration
//! and the test suites; real backends implement the same traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use streamd_types::PipelineState;

use crate::error::{EngineError, EngineResult};
use crate::traits::{Engine, EngineElement, EnginePipeline};
use crate::types::{
    Access, BusMessage, DebugSettings, MessageFilter, MessageType, PipelineEvent, PropertySchema,
    PropertyValue, SignalSchema, StateChange, StateChangeResult, ValueKind,
};

struct FactoryDef {
    name: &'static str,
    properties: Vec<PropertySchema>,
    signals: Vec<SignalSchema>,
    actions: Vec<SignalSchema>,
}

fn prop(
    name: &str,
    description: &str,
    access: Access,
    default: PropertyValue,
) -> PropertySchema {
    PropertySchema {
        name: name.to_string(),
        description: description.to_string(),
        kind: default.kind(),
        access,
        default,
    }
}

fn handoff_signal() -> SignalSchema {
    SignalSchema {
        name: "handoff".to_string(),
        arguments: vec![ValueKind::String, ValueKind::String],
        return_type: None,
    }
}

fn registry() -> &'static [FactoryDef] {
    static REGISTRY: OnceLock<Vec<FactoryDef>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            FactoryDef {
                name: "fakesrc",
                properties: vec![
                    prop(
                        "num-buffers",
                        "Number of buffers to output before sending EOS (-1 = unlimited)",
                        Access::ReadWrite,
                        PropertyValue::Int(-1),
                    ),
                    prop(
                        "silent",
                        "Don't produce last-message events",
                        Access::ReadWrite,
                        PropertyValue::Bool(true),
                    ),
                    prop(
                        "datarate",
                        "Data rate in bytes per second (0 = unlimited)",
                        Access::ReadWrite,
                        PropertyValue::Int(0),
                    ),
                    prop(
                        "last-message",
                        "The message describing the last event",
                        Access::Read,
                        PropertyValue::String(String::new()),
                    ),
                ],
                signals: vec![handoff_signal()],
                actions: vec![],
            },
            FactoryDef {
                name: "fakesink",
                properties: vec![
                    prop(
                        "sync",
                        "Synchronize on the clock",
                        Access::ReadWrite,
                        PropertyValue::Bool(false),
                    ),
                    prop(
                        "silent",
                        "Don't produce last-message events",
                        Access::ReadWrite,
                        PropertyValue::Bool(true),
                    ),
                    prop(
                        "last-message",
                        "The message describing the last event",
                        Access::Read,
                        PropertyValue::String(String::new()),
                    ),
                ],
                signals: vec![handoff_signal()],
                actions: vec![],
            },
            FactoryDef {
                name: "identity",
                properties: vec![
                    prop(
                        "silent",
                        "Don't produce last-message events",
                        Access::ReadWrite,
                        PropertyValue::Bool(true),
                    ),
                    prop(
                        "sleep-time",
                        "Microseconds to sleep per buffer",
                        Access::ReadWrite,
                        PropertyValue::UInt(0),
                    ),
                    prop(
                        "drop-probability",
                        "Probability of dropping a buffer",
                        Access::ReadWrite,
                        PropertyValue::Float(0.0),
                    ),
                    prop(
                        "dump",
                        "Dump buffer contents to stdout",
                        Access::ReadWrite,
                        PropertyValue::Bool(false),
                    ),
                ],
                signals: vec![handoff_signal()],
                actions: vec![],
            },
            FactoryDef {
                name: "queue",
                properties: vec![
                    prop(
                        "max-size-buffers",
                        "Maximum number of buffers in the queue (0 = unlimited)",
                        Access::ReadWrite,
                        PropertyValue::UInt(200),
                    ),
                    prop(
                        "max-size-bytes",
                        "Maximum amount of data in the queue in bytes (0 = unlimited)",
                        Access::ReadWrite,
                        PropertyValue::UInt(10485760),
                    ),
                    prop(
                        "max-size-time",
                        "Maximum amount of data in the queue in nanoseconds (0 = unlimited)",
                        Access::ReadWrite,
                        PropertyValue::UInt64(1_000_000_000),
                    ),
                    prop(
                        "current-level-buffers",
                        "Current number of buffers in the queue",
                        Access::Read,
                        PropertyValue::UInt(0),
                    ),
                    prop(
                        "leaky",
                        "Where the queue leaks, if at all",
                        Access::ReadWrite,
                        PropertyValue::Enum("no".to_string()),
                    ),
                ],
                signals: vec![],
                actions: vec![],
            },
            FactoryDef {
                name: "appsink",
                properties: vec![
                    prop(
                        "emit-signals",
                        "Emit new-sample signals",
                        Access::ReadWrite,
                        PropertyValue::Bool(false),
                    ),
                    prop(
                        "drop",
                        "Drop old buffers when the buffer queue is full",
                        Access::ReadWrite,
                        PropertyValue::Bool(false),
                    ),
                    prop(
                        "max-buffers",
                        "Maximum number of queued buffers (0 = unlimited)",
                        Access::ReadWrite,
                        PropertyValue::UInt(0),
                    ),
                    prop(
                        "sync",
                        "Synchronize on the clock",
                        Access::ReadWrite,
                        PropertyValue::Bool(true),
                    ),
                    prop(
                        "eos",
                        "Whether the sink is at end-of-stream",
                        Access::Read,
                        PropertyValue::Bool(false),
                    ),
                ],
                signals: vec![SignalSchema {
                    name: "new-sample".to_string(),
                    arguments: vec![],
                    return_type: Some(ValueKind::Enum),
                }],
                actions: vec![
                    SignalSchema {
                        name: "pull-sample".to_string(),
                        arguments: vec![],
                        return_type: Some(ValueKind::String),
                    },
                    SignalSchema {
                        name: "try-pull-sample".to_string(),
                        arguments: vec![ValueKind::UInt64],
                        return_type: Some(ValueKind::String),
                    },
                ],
            },
        ]
    })
}

fn find_factory(name: &str) -> EngineResult<&'static FactoryDef> {
    registry()
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| EngineError::UnknownFactory(name.to_string()))
}

/// The built-in backend.
#[derive(Default)]
pub struct SimEngine {
    debug: RwLock<DebugSettings>,
}

impl SimEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for SimEngine {
    fn build_pipeline(
        &self,
        name: &str,
        description: &str,
    ) -> EngineResult<Arc<dyn EnginePipeline>> {
        let elements = parse_description(description)?;
        debug!(pipeline = name, elements = elements.len(), "built pipeline graph");
        Ok(Arc::new(SimPipeline {
            name: name.to_string(),
            elements,
            state: Mutex::new(PipelineState::Null),
            bus: SimBus::new(),
        }))
    }

    fn set_debug(&self, settings: DebugSettings) {
        debug!(?settings, "debug settings changed");
        *self.debug.write().expect("lock poisoned") = settings;
    }

    fn debug(&self) -> DebugSettings {
        self.debug.read().expect("lock poisoned").clone()
    }
}

/// Parse a `factory [key=value…] ( ! factory [key=value…] )*` description.
fn parse_description(description: &str) -> EngineResult<Vec<Arc<SimElement>>> {
    let description = description.trim();
    if description.is_empty() {
        return Err(EngineError::Parse("empty pipeline description".into()));
    }

    let mut elements: Vec<Arc<SimElement>> = Vec::new();
    let mut counters: HashMap<&str, usize> = HashMap::new();

    for segment in description.split('!') {
        let mut tokens = segment.split_whitespace();
        let factory_name = tokens
            .next()
            .ok_or_else(|| EngineError::Parse("dangling '!' in description".into()))?;
        let factory = find_factory(factory_name)?;

        let mut instance_name = None;
        let mut values: HashMap<String, PropertyValue> = factory
            .properties
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect();

        for token in tokens {
            let (key, value) = token.split_once('=').ok_or_else(|| {
                EngineError::Parse(format!("expected key=value, got {token:?}"))
            })?;
            if key == "name" {
                instance_name = Some(value.to_string());
                continue;
            }
            let schema = factory
                .properties
                .iter()
                .find(|p| p.name == key)
                .ok_or_else(|| {
                    EngineError::Parse(format!("no property {key:?} in element {factory_name:?}"))
                })?;
            if !schema.access.is_writable() {
                return Err(EngineError::Parse(format!(
                    "property {key:?} in element {factory_name:?} is not writable"
                )));
            }
            values.insert(key.to_string(), PropertyValue::parse(schema.kind, value)?);
        }

        let name = instance_name.unwrap_or_else(|| {
            let counter = counters.entry(factory.name).or_insert(0);
            let name = format!("{}{}", factory.name, counter);
            *counter += 1;
            name
        });
        if elements.iter().any(|e| e.name == name) {
            return Err(EngineError::Parse(format!("duplicate element name {name:?}")));
        }

        elements.push(Arc::new(SimElement {
            name,
            factory,
            values: RwLock::new(values),
            sample_seq: AtomicU64::new(0),
            signal_gate: (Mutex::new(()), Condvar::new()),
        }));
    }

    Ok(elements)
}

struct SimBus {
    queue: Mutex<VecDeque<BusMessage>>,
    available: Condvar,
}

impl SimBus {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    fn push(&self, message: BusMessage) {
        self.queue.lock().expect("lock poisoned").push_back(message);
        self.available.notify_all();
    }

    fn pop(&self, timeout: Option<Duration>, filter: &MessageFilter) -> Option<BusMessage> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut queue = self.queue.lock().expect("lock poisoned");
        loop {
            if let Some(index) = queue.iter().position(|m| filter.accepts(m.kind)) {
                return queue.remove(index);
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    let (guard, result) = self
                        .available
                        .wait_timeout(queue, deadline - now)
                        .expect("lock poisoned");
                    queue = guard;
                    if result.timed_out()
                        && !queue.iter().any(|m| filter.accepts(m.kind))
                    {
                        return None;
                    }
                }
                None => {
                    queue = self.available.wait(queue).expect("lock poisoned");
                }
            }
        }
    }
}

struct SimPipeline {
    name: String,
    elements: Vec<Arc<SimElement>>,
    state: Mutex<PipelineState>,
    bus: SimBus,
}

impl EnginePipeline for SimPipeline {
    fn set_state(&self, state: PipelineState) -> EngineResult<StateChange> {
        let mut current = self.state.lock().expect("lock poisoned");
        let old = *current;
        *current = state;
        drop(current);
        if old != state {
            self.bus.push(BusMessage {
                kind: MessageType::StateChanged,
                source: self.name.clone(),
                payload: json!({ "old": old.as_str(), "new": state.as_str() }),
            });
        }
        Ok(StateChange::Sync)
    }

    fn query_state(
        &self,
        _timeout: Duration,
    ) -> (PipelineState, Option<PipelineState>, StateChangeResult) {
        // Transitions are synchronous here, so there is never a pending state.
        let current = *self.state.lock().expect("lock poisoned");
        (current, None, StateChangeResult::Ok)
    }

    fn iterate_elements(&self) -> EngineResult<Vec<Arc<dyn EngineElement>>> {
        Ok(self
            .elements
            .iter()
            .map(|e| Arc::clone(e) as Arc<dyn EngineElement>)
            .collect())
    }

    fn post_event(&self, event: PipelineEvent) -> EngineResult<()> {
        match event {
            PipelineEvent::Eos => {
                self.bus.push(BusMessage {
                    kind: MessageType::Eos,
                    source: self.name.clone(),
                    payload: json!({}),
                });
            }
            PipelineEvent::FlushStart | PipelineEvent::FlushStop => {
                // Flushing has no observable effect on a simulated graph.
            }
            PipelineEvent::Seek { rate, start, stop } => {
                debug!(pipeline = %self.name, rate, ?start, ?stop, "seek event");
            }
        }
        Ok(())
    }

    fn bus_pop(&self, timeout: Option<Duration>, filter: &MessageFilter) -> Option<BusMessage> {
        self.bus.pop(timeout, filter)
    }
}

struct SimElement {
    name: String,
    factory: &'static FactoryDef,
    values: RwLock<HashMap<String, PropertyValue>>,
    sample_seq: AtomicU64,
    // Signals never fire spontaneously in the simulated backend; waiters
    // block on this gate until their timeout expires.
    signal_gate: (Mutex<()>, Condvar),
}

impl EngineElement for SimElement {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn factory(&self) -> String {
        self.factory.name.to_string()
    }

    fn list_properties(&self) -> Vec<PropertySchema> {
        self.factory.properties.clone()
    }

    fn property_schema(&self, name: &str) -> Option<PropertySchema> {
        self.factory.properties.iter().find(|p| p.name == name).cloned()
    }

    fn get_property(&self, name: &str) -> EngineResult<PropertyValue> {
        self.values
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NoSuchProperty(name.to_string()))
    }

    fn set_property(&self, name: &str, value: &str) -> EngineResult<()> {
        let schema = self
            .property_schema(name)
            .ok_or_else(|| EngineError::NoSuchProperty(name.to_string()))?;
        if !schema.access.is_writable() {
            return Err(EngineError::ReadOnlyProperty(name.to_string()));
        }
        let parsed = PropertyValue::parse(schema.kind, value)?;
        self.values
            .write()
            .expect("lock poisoned")
            .insert(name.to_string(), parsed);
        Ok(())
    }

    fn list_signals(&self) -> Vec<SignalSchema> {
        self.factory.signals.clone()
    }

    fn list_actions(&self) -> Vec<SignalSchema> {
        self.factory.actions.clone()
    }

    fn emit_action(&self, name: &str, args: &[&str]) -> EngineResult<Option<PropertyValue>> {
        let schema = self
            .factory
            .actions
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| EngineError::NoSuchSignal(name.to_string()))?;
        if args.len() < schema.arguments.len() {
            return Err(EngineError::InvalidValue(format!(
                "action {name:?} requires {} arguments, got {}",
                schema.arguments.len(),
                args.len()
            )));
        }
        // Convert every declared argument; surplus tokens are ignored.
        for (kind, token) in schema.arguments.iter().zip(args) {
            PropertyValue::parse(*kind, token)?;
        }
        match name {
            "pull-sample" | "try-pull-sample" => {
                let seq = self.sample_seq.fetch_add(1, Ordering::Relaxed);
                Ok(Some(PropertyValue::String(format!(
                    "{}:sample-{}",
                    self.name, seq
                ))))
            }
            _ => Ok(None),
        }
    }

    fn wait_signal(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> EngineResult<Vec<PropertyValue>> {
        if !self.factory.signals.iter().any(|s| s.name == name) {
            return Err(EngineError::NoSuchSignal(name.to_string()));
        }
        let (lock, condvar) = &self.signal_gate;
        let mut guard = lock.lock().expect("lock poisoned");
        match timeout {
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(EngineError::Timeout);
                    }
                    let (g, _) = condvar
                        .wait_timeout(guard, deadline - now)
                        .expect("lock poisoned");
                    guard = g;
                }
            }
            None => loop {
                guard = condvar.wait(guard).expect("lock poisoned");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(description: &str) -> Arc<dyn EnginePipeline> {
        SimEngine::new().build_pipeline("p0", description).unwrap()
    }

    // -----------------------------------------------------------------------
    // Description parsing
    // -----------------------------------------------------------------------

    #[test]
    fn build_simple_pipeline() {
        let pipeline = build("fakesrc ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].name(), "fakesrc0");
        assert_eq!(elements[1].name(), "fakesink0");
    }

    #[test]
    fn build_with_names_and_properties() {
        let pipeline = build("fakesrc name=src num-buffers=100 ! queue ! fakesink name=sink");
        let elements = pipeline.iterate_elements().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].name(), "src");
        assert_eq!(
            elements[0].get_property("num-buffers").unwrap(),
            PropertyValue::Int(100)
        );
        assert_eq!(elements[2].name(), "sink");
    }

    #[test]
    fn auto_names_count_per_factory() {
        let pipeline = build("fakesrc ! identity ! identity ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        assert_eq!(elements[1].name(), "identity0");
        assert_eq!(elements[2].name(), "identity1");
    }

    #[test]
    fn unknown_factory_fails() {
        let err = SimEngine::new()
            .build_pipeline("p0", "not_a_real_element ! fakesink")
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownFactory("not_a_real_element".into()));
    }

    #[test]
    fn empty_description_fails() {
        let err = SimEngine::new().build_pipeline("p0", "   ").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn bad_property_token_fails() {
        let err = SimEngine::new()
            .build_pipeline("p0", "fakesrc num-buffers=abc ! fakesink")
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(_)));
    }

    #[test]
    fn unknown_property_in_description_fails() {
        let err = SimEngine::new()
            .build_pipeline("p0", "fakesrc bogus=1 ! fakesink")
            .unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn duplicate_names_fail() {
        let err = SimEngine::new()
            .build_pipeline("p0", "fakesrc name=x ! fakesink name=x")
            .unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    // -----------------------------------------------------------------------
    // State machine and bus
    // -----------------------------------------------------------------------

    #[test]
    fn state_transitions_are_synchronous() {
        let pipeline = build("fakesrc ! fakesink");
        assert_eq!(
            pipeline.set_state(PipelineState::Playing).unwrap(),
            StateChange::Sync
        );
        let (current, pending, result) = pipeline.query_state(Duration::from_millis(100));
        assert_eq!(current, PipelineState::Playing);
        assert_eq!(pending, None);
        assert_eq!(result, StateChangeResult::Ok);
    }

    #[test]
    fn state_change_posts_bus_message() {
        let pipeline = build("fakesrc ! fakesink");
        pipeline.set_state(PipelineState::Playing).unwrap();
        let filter = MessageFilter::parse("state-changed").unwrap();
        let message = pipeline
            .bus_pop(Some(Duration::from_millis(100)), &filter)
            .unwrap();
        assert_eq!(message.kind, MessageType::StateChanged);
        assert_eq!(message.payload["new"], "playing");
    }

    #[test]
    fn eos_event_reaches_bus() {
        let pipeline = build("fakesrc ! fakesink");
        pipeline.post_event(PipelineEvent::Eos).unwrap();
        let filter = MessageFilter::parse("eos").unwrap();
        let message = pipeline
            .bus_pop(Some(Duration::from_millis(100)), &filter)
            .unwrap();
        assert_eq!(message.kind, MessageType::Eos);
        assert_eq!(message.source, "p0");
    }

    #[test]
    fn bus_pop_honors_filter() {
        let pipeline = build("fakesrc ! fakesink");
        pipeline.set_state(PipelineState::Paused).unwrap();
        pipeline.post_event(PipelineEvent::Eos).unwrap();
        // Only EOS passes; the earlier state-changed message stays queued.
        let filter = MessageFilter::parse("eos").unwrap();
        let message = pipeline
            .bus_pop(Some(Duration::from_millis(100)), &filter)
            .unwrap();
        assert_eq!(message.kind, MessageType::Eos);
        let all = MessageFilter::default();
        let rest = pipeline.bus_pop(Some(Duration::from_millis(100)), &all).unwrap();
        assert_eq!(rest.kind, MessageType::StateChanged);
    }

    #[test]
    fn bus_pop_times_out_on_empty_queue() {
        let pipeline = build("fakesrc ! fakesink");
        let start = Instant::now();
        let popped = pipeline.bus_pop(Some(Duration::from_millis(20)), &MessageFilter::default());
        assert!(popped.is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    // -----------------------------------------------------------------------
    // Element surface
    // -----------------------------------------------------------------------

    #[test]
    fn property_get_after_set() {
        let pipeline = build("fakesrc name=src ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        let src = &elements[0];
        src.set_property("num-buffers", "50").unwrap();
        assert_eq!(
            src.get_property("num-buffers").unwrap(),
            PropertyValue::Int(50)
        );
    }

    #[test]
    fn read_only_property_rejects_set() {
        let pipeline = build("fakesrc ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        let err = elements[0].set_property("last-message", "x").unwrap_err();
        assert_eq!(err, EngineError::ReadOnlyProperty("last-message".into()));
    }

    #[test]
    fn unknown_property_rejected() {
        let pipeline = build("fakesrc ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        assert!(matches!(
            elements[0].get_property("bogus").unwrap_err(),
            EngineError::NoSuchProperty(_)
        ));
    }

    #[test]
    fn appsink_actions() {
        let pipeline = build("fakesrc ! appsink name=sink");
        let elements = pipeline.iterate_elements().unwrap();
        let sink = &elements[1];

        let first = sink.emit_action("pull-sample", &[]).unwrap().unwrap();
        let second = sink.emit_action("pull-sample", &[]).unwrap().unwrap();
        assert_ne!(first, second);

        // try-pull-sample requires its timeout argument.
        let err = sink.emit_action("try-pull-sample", &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(_)));
        assert!(sink.emit_action("try-pull-sample", &["100"]).is_ok());
        let err = sink.emit_action("try-pull-sample", &["-1"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue(_)));
    }

    #[test]
    fn unknown_action_rejected() {
        let pipeline = build("fakesrc ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        assert!(matches!(
            elements[1].emit_action("bogus", &[]).unwrap_err(),
            EngineError::NoSuchSignal(_)
        ));
    }

    #[test]
    fn wait_signal_times_out() {
        let pipeline = build("fakesrc ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        let start = Instant::now();
        let err = elements[0]
            .wait_signal("handoff", Some(Duration::from_millis(20)))
            .unwrap_err();
        assert_eq!(err, EngineError::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wait_unknown_signal_rejected() {
        let pipeline = build("fakesrc ! fakesink");
        let elements = pipeline.iterate_elements().unwrap();
        assert!(matches!(
            elements[0]
                .wait_signal("bogus", Some(Duration::from_millis(10)))
                .unwrap_err(),
            EngineError::NoSuchSignal(_)
        ));
    }

    #[test]
    fn schemas_are_exposed() {
        let pipeline = build("appsink");
        let elements = pipeline.iterate_elements().unwrap();
        let sink = &elements[0];
        assert!(sink.list_properties().iter().any(|p| p.name == "emit-signals"));
        assert!(sink.list_signals().iter().any(|s| s.name == "new-sample"));
        let pull = sink
            .list_actions()
            .into_iter()
            .find(|a| a.name == "pull-sample")
            .unwrap();
        assert_eq!(pull.return_type, Some(ValueKind::String));
    }

    #[test]
    fn debug_settings_roundtrip() {
        let engine = SimEngine::new();
        assert_eq!(engine.debug(), DebugSettings::default());
        engine.set_debug(DebugSettings {
            enabled: true,
            color: false,
            threshold: "trace".to_string(),
        });
        let settings = engine.debug();
        assert!(settings.enabled);
        assert!(!settings.color);
        assert_eq!(settings.threshold, "trace");
    }
}

use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Duration;

use tracing::debug;

use streamd_engine::EnginePipeline;
use streamd_format::{Formatter, FormatterFactory};
use streamd_types::{ControlError, ControlResult, PipelineState};

use crate::bus::BusNode;
use crate::element::Elements;
use crate::event::EventFactory;
use crate::node::Node;
use crate::state::StateNode;

/// State queries are bounded, never zero-timeout: a no-wait query misreports
/// during asynchronous transitions.
pub(crate) const STATE_QUERY_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Clone)]
struct Children {
    elements: Arc<Elements>,
    bus: Arc<BusNode>,
    state: Arc<StateNode>,
    event: Arc<EventFactory>,
}

/// A live pipeline: the engine handle plus the sub-tree a client navigates.
///
/// The `elements`, `bus`, `state`, and `event` children are constructed on
/// first resolution and dropped with the pipeline. The play-hold counter
/// tracks transitions into and out of the active states; while it is
/// non-zero the pipeline refuses deletion.
pub struct Pipeline {
    name: String,
    description: String,
    handle: Arc<dyn EnginePipeline>,
    factory: Arc<dyn FormatterFactory>,
    play_hold: Mutex<u32>,
    children: RwLock<Option<Children>>,
    self_ref: Weak<Pipeline>,
}

impl Pipeline {
    pub(crate) fn new(
        name: &str,
        description: &str,
        handle: Arc<dyn EnginePipeline>,
        factory: Arc<dyn FormatterFactory>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            name: name.to_string(),
            description: description.to_string(),
            handle,
            factory,
            play_hold: Mutex::new(0),
            children: RwLock::new(None),
            self_ref: self_ref.clone(),
        })
    }

    fn children(&self) -> Children {
        if let Some(children) = self.children.read().expect("lock poisoned").as_ref() {
            return children.clone();
        }
        let mut slot = self.children.write().expect("lock poisoned");
        if let Some(children) = slot.as_ref() {
            return children.clone();
        }
        let children = Children {
            elements: Arc::new(Elements::new(self.handle.clone(), self.factory.clone())),
            bus: Arc::new(BusNode::new(self.handle.clone(), self.factory.clone())),
            state: Arc::new(StateNode::new(
                self.self_ref.clone(),
                self.handle.clone(),
                self.factory.clone(),
            )),
            event: Arc::new(EventFactory::new(self.handle.clone(), self.factory.clone())),
        };
        *slot = Some(children.clone());
        children
    }

    /// Current state via a bounded engine query.
    pub fn current_state(&self) -> PipelineState {
        let (current, _, _) = self.handle.query_state(STATE_QUERY_TIMEOUT);
        current
    }

    /// Number of outstanding play holds.
    pub fn play_hold(&self) -> u32 {
        *self.play_hold.lock().expect("lock poisoned")
    }

    pub(crate) fn play_hold_guard(&self) -> MutexGuard<'_, u32> {
        self.play_hold.lock().expect("lock poisoned")
    }

    /// Drive a state transition and keep the play hold balanced.
    ///
    /// The hold lock is held across the query and the transition so a
    /// concurrent delete cannot observe a torn increment.
    pub(crate) fn transition(&self, target: PipelineState) -> ControlResult<()> {
        let mut hold = self.play_hold.lock().expect("lock poisoned");
        let (current, _, _) = self.handle.query_state(STATE_QUERY_TIMEOUT);
        if current == target {
            return Err(ControlError::NoUpdate);
        }
        self.handle.set_state(target)?;
        if target.is_active() && !current.is_active() {
            *hold += 1;
        } else if current.is_active() && !target.is_active() {
            *hold = hold.saturating_sub(1);
        }
        debug!(
            pipeline = %self.name,
            from = current.as_str(),
            to = target.as_str(),
            hold = *hold,
            "state transition"
        );
        Ok(())
    }
}

impl Node for Pipeline {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn kind(&self) -> &'static str {
        "pipeline"
    }

    fn child(&self, name: &str) -> ControlResult<Option<Arc<dyn Node>>> {
        let children = self.children();
        Ok(match name {
            "elements" => Some(children.elements as Arc<dyn Node>),
            "bus" => Some(children.bus as Arc<dyn Node>),
            "state" => Some(children.state as Arc<dyn Node>),
            "event" => Some(children.event as Arc<dyn Node>),
            _ => None,
        })
    }

    fn describe(&self, fmt: &mut dyn Formatter) -> ControlResult<()> {
        fmt.begin_object()?;
        fmt.set_member_name("name")?;
        fmt.set_string(&self.name)?;
        fmt.set_member_name("description")?;
        fmt.set_string(&self.description)?;
        fmt.set_member_name("state")?;
        fmt.set_string(self.current_state().as_str())?;
        fmt.set_member_name("children")?;
        fmt.begin_array()?;
        for child in ["elements", "bus", "state", "event"] {
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

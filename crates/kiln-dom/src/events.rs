//! DOM Events
//!
//! Custom events, listeners, and propagation flags.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::NodeId;

/// Event listener callback
pub type EventHandler = Rc<dyn Fn(&mut Event)>;

/// Handle returned when registering a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Registered listener
#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) event_type: String,
    pub(crate) handler: EventHandler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Event construction options
#[derive(Debug, Clone, Default)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    /// Crosses shadow-root boundaries while bubbling
    pub composed: bool,
    pub detail: Value,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    /// Payload of a custom event (`Null` when absent)
    pub detail: Value,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    /// Node the event was dispatched on
    pub target: Option<NodeId>,
    /// Node whose listeners are currently running
    pub current_target: Option<NodeId>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Plain non-bubbling event
    pub fn new(event_type: &str) -> Self {
        Self::with_init(event_type, EventInit::default())
    }

    /// Custom event carrying a detail payload
    pub fn custom(event_type: &str, detail: Value) -> Self {
        Self::with_init(event_type, EventInit { detail, ..Default::default() })
    }

    pub fn with_init(event_type: &str, init: EventInit) -> Self {
        Self {
            event_type: event_type.to_string(),
            detail: init.detail,
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            composed: init.composed,
            target: None,
            current_target: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

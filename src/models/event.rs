// Change notifications carried by the event bus

use serde::{Deserialize, Serialize};

use super::ProcessState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    InterfaceChanged,
    ProcessStateChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    InterfaceChanged { interface_id: String },
    #[serde(rename_all = "camelCase")]
    ProcessStateChanged { pid: u32, state: ProcessState },
}

impl Event {
    pub fn interface_changed(interface_id: impl Into<String>) -> Self {
        Event::InterfaceChanged {
            interface_id: interface_id.into(),
        }
    }

    pub fn process_state_changed(pid: u32, state: ProcessState) -> Self {
        Event::ProcessStateChanged { pid, state }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::InterfaceChanged { .. } => EventKind::InterfaceChanged,
            Event::ProcessStateChanged { .. } => EventKind::ProcessStateChanged,
        }
    }
}

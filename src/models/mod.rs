// Domain models shared by the registry, the process manager and the event bus

mod event;
mod interface;
mod process;
mod profile;

pub use event::{Event, EventKind};
pub use interface::{
    AdapterType, InterfaceHandle, InterfaceInfo, InterfaceStatistics, InterfaceStatus,
};
pub use process::{ProcessRecord, ProcessState};
pub use profile::Profile;

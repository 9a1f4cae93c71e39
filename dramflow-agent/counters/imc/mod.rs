pub mod backend;
pub mod discovery;
pub mod events;
pub mod monitor;

pub use backend::{CounterBackend, CounterHandle, KernelBackend, KernelCounter};
pub use discovery::discover_imc_devices;
pub use events::{resolve_event, Direction, EventSource, ResolvedEvent};
pub use monitor::{Counter, DramCounter};

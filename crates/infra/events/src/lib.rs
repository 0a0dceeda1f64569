//! Broadcast fabric internals: the in-process bus, the dashboard fan-out
//! hub, the targeted session-socket registry, and process-wide counters.

pub mod bus;
pub mod counters;
pub mod hub;
pub mod registry;
pub mod sse;

pub use bus::{BusError, EventBus, Subject, REPLAY_WINDOW};
pub use hub::{DashboardHub, HubConnection, MAX_BUFFERED_BYTES};
pub use registry::SessionSocketRegistry;
pub use sse::{standard_keep_alive, ToSse, HEARTBEAT_INTERVAL, HEARTBEAT_JSON};

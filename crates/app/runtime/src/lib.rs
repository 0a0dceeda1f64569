//! Application runtime: owns process-wide state and the worker topology.
//!
//! One worker per shard, per-session affinity through stable hashing, CPU
//! stages inline on the worker, I/O deadline-bound. Nothing here holds a
//! back-reference to its caller.

pub mod context;
pub mod pipeline;
pub mod shards;
pub mod startup;
pub mod sweeper;

pub use context::{AppContext, AppContextBuilder};
pub use shards::{RuntimeHandles, ShardPool};
pub use startup::{probe_bus, probe_identity, StartupError};

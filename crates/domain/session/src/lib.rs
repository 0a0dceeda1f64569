//! Session domain: the sharded session store and the physics accumulator.
//!
//! The store is the sole owner of mutable session state. Other components
//! receive cloned snapshots; mutation happens only through the owning shard
//! worker, which gives per-session total order without global locking.

pub mod error;
pub mod physics;
pub mod store;

pub use error::{Result, SessionError};
pub use physics::PhysicsEngine;
pub use store::{
    AppendOutcome, SessionSnapshot, SessionStore, TerminatedSession, DEDUP_WINDOW_MS,
    EMOTION_HISTORY_LEN, EVENT_HISTORY_LEN,
};

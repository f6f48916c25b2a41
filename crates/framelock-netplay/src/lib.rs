//! Deterministic frame-stepped netplay synchronization.
//!
//! This crate keeps a deterministic simulation in sync between peers
//! connected over an externally supplied ordered channel, using one of two
//! interchangeable strategies:
//!
//! - **Lockstep**: advance a frame only once every player's real input for
//!   that frame is known; otherwise stall. Trivially correct, latency-bound.
//! - **Rollback**: advance immediately on predicted inputs, snapshot every
//!   frame, and resimulate from a snapshot whenever a late input contradicts
//!   a prediction. Hides latency at the cost of resimulation work.
//!
//! # Architecture
//!
//! - [`input`]: per-player input logs (confirmed vs predicted entries)
//! - [`sync`]: the two engines plus the snapshot ring
//! - [`session`]: transport-boundary dispatch, ping echo, state-sync cadence
//! - [`rtt`]: exponentially-weighted RTT estimation from ping probes
//! - [`sink`]: outbound message port, injected at construction
//! - [`error`]: error types
//!
//! The simulation itself is opaque to this crate: anything implementing
//! [`SyncState`] can be driven. A fixed-rate driver owns an engine (or an
//! [`Endpoint`] wrapping one) and calls `tick(local_input)` once per
//! timestep; message-arrival callbacks are interleaved with ticks by the
//! same thread, never concurrently.

pub mod config;
pub mod error;
pub mod input;
pub mod player;
pub mod rtt;
pub mod session;
pub mod sink;
pub mod state;
pub mod sync;

// Re-export commonly used types
pub use config::{Role, SessionConfig};
pub use error::NetplayError;
pub use framelock_netproto::messages::{Frame, Message, PlayerId};
pub use input::{GameInput, InputLog, InputOrigin};
pub use player::Player;
pub use rtt::RttEstimator;
pub use session::Endpoint;
pub use sink::{FnSink, MemorySink, MessageSink};
pub use state::{FrameInputs, SyncState};
pub use sync::{
    NetcodeEngine, TickOutcome, lockstep::LockstepNetcode, rollback::RollbackNetcode,
};

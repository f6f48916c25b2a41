//! Synchronization strategies.
//!
//! Two interchangeable engines drive the simulation:
//! - **Lockstep**: wait for every player's confirmed input before each frame.
//! - **Rollback**: advance on predictions, snapshot, resimulate on
//!   misprediction.

pub mod lockstep;
pub mod rollback;
pub mod snapshot;

use framelock_netproto::messages::{Frame, PlayerId};

use crate::{config::SessionConfig, error::NetplayError, input::GameInput};

/// What a driver tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The simulation stepped one frame forward.
    Advanced,
    /// The frame did not advance; the driver retries on its next tick.
    /// A logical skip, never a blocking wait.
    Stalled,
}

/// Common driver-facing surface of the two engines.
///
/// The session layer talks to engines only through this trait, so the
/// strategies stay interchangeable behind one dispatch path.
pub trait NetcodeEngine<I: GameInput> {
    /// Advance one frame if the strategy allows it. Called once per
    /// timestep by the fixed-rate driver; `local_input` is this frame's
    /// locally captured input.
    fn tick(&mut self, local_input: I) -> Result<TickOutcome, NetplayError>;

    /// Feed a confirmed input that arrived from a remote player.
    fn on_remote_input(
        &mut self,
        frame: Frame,
        player: PlayerId,
        input: I,
    ) -> Result<(), NetplayError>;

    /// Feed an authoritative state snapshot from the host (serialized).
    fn on_state_sync(&mut self, frame: Frame, state: &[u8]) -> Result<(), NetplayError>;

    /// The frame the next tick would simulate.
    fn current_frame(&self) -> Frame;

    /// True when the next tick will not advance the simulation.
    fn should_stall(&self) -> bool;

    /// The current simulation state, serialized for the state-sync channel.
    fn state_bytes(&self) -> Result<Vec<u8>, NetplayError>;

    fn config(&self) -> &SessionConfig;
}

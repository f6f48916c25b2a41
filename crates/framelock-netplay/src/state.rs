use std::collections::BTreeMap;

use framelock_netproto::messages::PlayerId;
use serde::{Serialize, de::DeserializeOwned};

use crate::input::GameInput;

/// The full set of inputs applied at one frame, one entry per player.
///
/// A `BTreeMap` so that iteration order is deterministic across peers:
/// the transition function must see players in the same order everywhere.
pub type FrameInputs<I> = BTreeMap<PlayerId, I>;

/// An opaque, snapshot-able simulation driven by the engines.
///
/// The transition must be a pure function of the previous state and the
/// frame's inputs: given identical inputs, `step` must produce identical
/// states on every peer. Any hidden nondeterminism (wall clock, unseeded
/// randomness, iteration over unordered collections) will surface as
/// divergence.
///
/// `Clone` provides snapshots; the serde bounds carry the state over the
/// state-sync channel and back.
pub trait SyncState<I: GameInput>: Clone + Serialize + DeserializeOwned {
    /// Advance by exactly one frame.
    fn step(&mut self, inputs: &FrameInputs<I>);
}

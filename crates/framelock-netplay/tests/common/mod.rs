#![allow(dead_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use framelock_netplay::{
    Endpoint, FrameInputs, MemorySink, NetcodeEngine, NetplayError, Player, PlayerId, SyncState,
};

/// A pad input for the test simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PadInput {
    pub dx: i8,
    pub fire: bool,
}

impl PadInput {
    pub fn dx(dx: i8) -> Self {
        Self { dx, fire: false }
    }
}

/// A deliberately simple deterministic simulation: every player drags a
/// position around and fire presses are tallied globally.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    pub positions: BTreeMap<PlayerId, i64>,
    pub shots: u64,
}

impl SyncState<PadInput> for GridState {
    fn step(&mut self, inputs: &FrameInputs<PadInput>) {
        for (player, input) in inputs {
            *self.positions.entry(*player).or_insert(0) += i64::from(input.dx);
            if input.fire {
                self.shots += 1;
            }
        }
    }
}

/// Standard two-player roster: player 0 hosts.
pub fn roster(local: PlayerId) -> Vec<Player> {
    vec![
        Player::new(0, local == 0, true),
        Player::new(1, local == 1, false),
    ]
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Deliver every message one side has queued into the other endpoint.
pub fn pump<E: NetcodeEngine<PadInput>>(
    from: &MemorySink,
    to: &mut Endpoint<E, PadInput>,
    now_ms: u64,
) -> Result<(), NetplayError> {
    for message in from.drain() {
        to.handle_message(message, now_ms)?;
    }
    Ok(())
}

//! Lockstep synchronization.
//!
//! Advances the simulation one frame only when every player's real input for
//! that frame is known; otherwise the tick stalls and the driver retries.
//! Correctness is trivial (every step uses only confirmed inputs) at the
//! cost of end-to-end latency equal to the slowest peer's round trip.

use std::collections::BTreeMap;

use framelock_netproto::{
    codec,
    messages::{Frame, InputMsg, Message, PlayerId},
};
use tracing::{debug, warn};

use crate::{
    config::SessionConfig,
    error::NetplayError,
    input::{GameInput, InputLog, RemoteOutcome},
    player::{Player, validate_roster},
    sink::MessageSink,
    state::{FrameInputs, SyncState},
    sync::{NetcodeEngine, TickOutcome},
};

pub struct LockstepNetcode<S, I: GameInput> {
    config: SessionConfig,
    players: Vec<Player>,
    local: PlayerId,
    state: S,
    frame: Frame,
    logs: BTreeMap<PlayerId, InputLog<I>>,
    sink: Box<dyn MessageSink>,
    stalled: bool,
    missed_frames: u64,
    divergences: u64,
    state_syncs_received: u64,
}

impl<S: SyncState<I>, I: GameInput> LockstepNetcode<S, I> {
    pub fn new(
        config: SessionConfig,
        players: Vec<Player>,
        initial_state: S,
        sink: Box<dyn MessageSink>,
    ) -> Result<Self, NetplayError> {
        let local = validate_roster(&players, config.role)?;
        let logs = players
            .iter()
            .map(|p| (p.id, InputLog::new(p.id)))
            .collect();
        Ok(Self {
            config,
            players,
            local,
            state: initial_state,
            frame: 0,
            logs,
            sink,
            stalled: false,
            missed_frames: 0,
            divergences: 0,
            state_syncs_received: 0,
        })
    }

    /// Record and transmit the local input, then step iff every player's
    /// input for the current frame is confirmed.
    pub fn tick(&mut self, local_input: I) -> Result<TickOutcome, NetplayError> {
        self.capture_local(local_input)?;

        if !self.frame_ready() {
            self.stalled = true;
            self.missed_frames += 1;
            return Ok(TickOutcome::Stalled);
        }

        let inputs = self.frame_inputs();
        self.state.step(&inputs);
        self.frame += 1;
        self.stalled = false;

        // Consumed history is never revisited; drop it.
        for log in self.logs.values_mut() {
            log.prune_below(self.frame);
        }

        Ok(TickOutcome::Advanced)
    }

    /// Feed a confirmed input from a remote player. The stalled frame
    /// advances on the driver's next tick once the set is complete.
    pub fn on_remote_input(
        &mut self,
        frame: Frame,
        player: PlayerId,
        input: I,
    ) -> Result<(), NetplayError> {
        let log = self
            .logs
            .get_mut(&player)
            .ok_or(NetplayError::UnknownPlayer(player))?;
        let outcome = log.record_remote(frame, input)?;
        debug_assert_ne!(
            outcome,
            RemoteOutcome::Misprediction,
            "lockstep never predicts"
        );
        Ok(())
    }

    /// Advisory consistency check against the host's authoritative state.
    /// Never required for forward progress.
    pub fn on_state_sync(&mut self, frame: Frame, state: &[u8]) -> Result<(), NetplayError> {
        if self.config.role.is_host() {
            warn!(frame, "host received a state sync; ignoring");
            return Ok(());
        }
        self.state_syncs_received += 1;

        if frame != self.frame {
            debug!(
                frame,
                current = self.frame,
                "state sync for a non-current frame ignored"
            );
            return Ok(());
        }

        let local = codec::encode_payload(&self.state)?;
        if local != state {
            self.divergences += 1;
            warn!(frame, "state sync mismatch; adopting authoritative state");
            match codec::decode_payload::<S>(state) {
                Ok(authoritative) => self.state = authoritative,
                Err(error) => warn!(frame, %error, "dropping undecodable state sync"),
            }
        }
        Ok(())
    }

    pub fn current_frame(&self) -> Frame {
        self.frame
    }

    /// True when the last tick could not advance for lack of remote input.
    pub fn stalled(&self) -> bool {
        self.stalled
    }

    /// Ticks that did not advance the simulation.
    pub fn missed_frames(&self) -> u64 {
        self.missed_frames
    }

    pub fn divergences(&self) -> u64 {
        self.divergences
    }

    pub fn state_syncs_received(&self) -> u64 {
        self.state_syncs_received
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    fn capture_local(&mut self, local_input: I) -> Result<(), NetplayError> {
        let frame = self.frame;
        let local = self.local;
        let log = self.local_log();
        let next = log.highest_confirmed_frame().map_or(0, |f| f + 1);
        if next != frame {
            // Retrying a stalled frame: the input was already captured and
            // sent on the first attempt, and confirmed entries are immutable.
            return Ok(());
        }
        log.record_local(frame, local_input.clone());

        let bytes = codec::encode_payload(&local_input)?;
        self.sink.send(Message::Input(InputMsg {
            frame,
            player: local,
            input: bytes,
        }));
        Ok(())
    }

    fn frame_ready(&self) -> bool {
        self.players
            .iter()
            .all(|p| self.log(p.id).is_confirmed(self.frame))
    }

    fn frame_inputs(&self) -> FrameInputs<I> {
        self.players
            .iter()
            .map(|p| (p.id, self.log(p.id).input_at(self.frame).0))
            .collect()
    }

    fn log(&self, player: PlayerId) -> &InputLog<I> {
        self.logs
            .get(&player)
            .expect("roster validated at construction")
    }

    fn local_log(&mut self) -> &mut InputLog<I> {
        self.logs
            .get_mut(&self.local)
            .expect("roster validated at construction")
    }
}

impl<S: SyncState<I>, I: GameInput> NetcodeEngine<I> for LockstepNetcode<S, I> {
    fn tick(&mut self, local_input: I) -> Result<TickOutcome, NetplayError> {
        LockstepNetcode::tick(self, local_input)
    }

    fn on_remote_input(
        &mut self,
        frame: Frame,
        player: PlayerId,
        input: I,
    ) -> Result<(), NetplayError> {
        LockstepNetcode::on_remote_input(self, frame, player, input)
    }

    fn on_state_sync(&mut self, frame: Frame, state: &[u8]) -> Result<(), NetplayError> {
        LockstepNetcode::on_state_sync(self, frame, state)
    }

    fn current_frame(&self) -> Frame {
        self.frame
    }

    fn should_stall(&self) -> bool {
        !self.frame_ready()
    }

    fn state_bytes(&self) -> Result<Vec<u8>, NetplayError> {
        Ok(codec::encode_payload(&self.state)?)
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }
}

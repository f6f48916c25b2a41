//! Rollback synchronization.
//!
//! Advances the simulation immediately, predicting missing remote inputs by
//! holding each player's last known input. Every simulated frame leaves a
//! snapshot in a bounded ring; when a late confirmed input contradicts the
//! prediction it was simulated with, the engine restores the snapshot for
//! that frame and resimulates forward. The transition function is pure, so
//! resimulating with corrected inputs reproduces exactly what would have
//! happened had the input been known in time.

use std::collections::{BTreeMap, BTreeSet};

use framelock_netproto::{
    codec,
    messages::{Frame, InputMsg, Message, PlayerId},
};
use tracing::{debug, warn};

use crate::{
    config::SessionConfig,
    error::NetplayError,
    input::{GameInput, InputLog, InputOrigin, RemoteOutcome},
    player::{Player, validate_roster},
    sink::MessageSink,
    state::{FrameInputs, SyncState},
    sync::{NetcodeEngine, TickOutcome, snapshot::SnapshotRing},
};

pub struct RollbackNetcode<S, I: GameInput> {
    config: SessionConfig,
    players: Vec<Player>,
    local: PlayerId,
    state: S,
    frame: Frame,
    logs: BTreeMap<PlayerId, InputLog<I>>,
    ring: SnapshotRing<S>,
    sink: Box<dyn MessageSink>,
    mispredictions: u64,
    largest_future: u64,
    divergences: u64,
    state_syncs_received: u64,
}

impl<S: SyncState<I>, I: GameInput> RollbackNetcode<S, I> {
    pub fn new(
        config: SessionConfig,
        players: Vec<Player>,
        initial_state: S,
        sink: Box<dyn MessageSink>,
    ) -> Result<Self, NetplayError> {
        if config.max_prediction_window == 0 {
            return Err(NetplayError::InvalidConfig(
                "max_prediction_window must be at least 1".into(),
            ));
        }
        let local = validate_roster(&players, config.role)?;
        let logs = players
            .iter()
            .map(|p| (p.id, InputLog::new(p.id)))
            .collect();
        let ring = SnapshotRing::new(config.max_prediction_window + 1);
        Ok(Self {
            config,
            players,
            local,
            state: initial_state,
            frame: 0,
            logs,
            ring,
            sink,
            mispredictions: 0,
            largest_future: 0,
            divergences: 0,
            state_syncs_received: 0,
        })
    }

    /// Record and transmit the local input, then either stall (prediction
    /// window exhausted) or snapshot and step using confirmed-or-predicted
    /// inputs.
    pub fn tick(&mut self, local_input: I) -> Result<TickOutcome, NetplayError> {
        self.capture_local(local_input)?;

        if self.should_stall() {
            return Ok(TickOutcome::Stalled);
        }

        let inputs = self.inputs_for(self.frame);
        self.ring.push(self.frame, self.state.clone());
        self.state.step(&inputs);
        self.frame += 1;
        self.largest_future = self.largest_future.max(self.frames_ahead());

        Ok(TickOutcome::Advanced)
    }

    /// Feed a confirmed remote input. If it contradicts the prediction an
    /// already-simulated frame used, roll back to that frame and resimulate.
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

        if outcome == RemoteOutcome::Misprediction && frame < self.frame {
            self.mispredictions += 1;
            self.rollback_to(frame)?;
        }

        // History at or below the frontier is settled on every peer; keep
        // the ring and logs tight. The stall bound already guarantees a
        // correction can never target anything older than frontier + 1.
        if let Some(frontier) = self.confirmed_frontier() {
            self.ring.prune_below(frontier);
            for log in self.logs.values_mut() {
                log.prune_below(frontier);
            }
        }
        Ok(())
    }

    /// Apply an authoritative state from the host. A mismatch against the
    /// locally simulated state at that frame means the simulation is not
    /// deterministic; adopt the host's state and resimulate, mechanically
    /// the same recovery as an input-driven rollback.
    pub fn on_state_sync(&mut self, frame: Frame, state: &[u8]) -> Result<(), NetplayError> {
        if self.config.role.is_host() {
            warn!(frame, "host received a state sync; ignoring");
            return Ok(());
        }
        self.state_syncs_received += 1;

        let local_bytes = if frame == self.frame {
            codec::encode_payload(&self.state)?
        } else {
            match self.ring.get(frame) {
                Some(snapshot) => codec::encode_payload(snapshot)?,
                None => {
                    debug!(
                        frame,
                        current = self.frame,
                        "state sync outside the snapshot window ignored"
                    );
                    return Ok(());
                }
            }
        };

        if local_bytes == state {
            return Ok(());
        }

        let authoritative: S = match codec::decode_payload(state) {
            Ok(s) => s,
            Err(error) => {
                warn!(frame, %error, "dropping undecodable state sync");
                return Ok(());
            }
        };

        self.divergences += 1;
        warn!(
            frame,
            current = self.frame,
            "authoritative state differs from local simulation; resynchronizing"
        );

        self.state = authoritative;
        if frame < self.frame {
            self.ring.overwrite(frame, self.state.clone());
            self.resimulate(frame);
        }
        Ok(())
    }

    /// The frame the next tick would simulate.
    pub fn current_frame(&self) -> Frame {
        self.frame
    }

    /// True when simulating another frame would exceed the prediction
    /// window; the driver skips this tick and retries.
    pub fn should_stall(&self) -> bool {
        self.frames_ahead() >= self.config.max_prediction_window as u64
    }

    /// Snapshots currently retained.
    pub fn history_len(&self) -> usize {
        self.ring.len()
    }

    /// High-water mark of frames simulated ahead of the confirmed frontier.
    pub fn largest_future_size(&self) -> u64 {
        self.largest_future
    }

    /// Count of already-simulated frames that still rest on at least one
    /// predicted input.
    pub fn predicted_frames(&self) -> usize {
        let mut frames: BTreeSet<Frame> = BTreeSet::new();
        for log in self.logs.values() {
            frames.extend(log.predicted_frames().filter(|f| *f < self.frame));
        }
        frames.len()
    }

    /// Resimulations triggered by wrong predictions.
    pub fn mispredictions(&self) -> u64 {
        self.mispredictions
    }

    /// State-sync mismatches recovered from. Repeated divergence means the
    /// simulation itself is not deterministic.
    pub fn divergences(&self) -> u64 {
        self.divergences
    }

    pub fn state_syncs_received(&self) -> u64 {
        self.state_syncs_received
    }

    /// Highest frame for which every player's input is confirmed.
    pub fn confirmed_frontier(&self) -> Option<Frame> {
        self.players
            .iter()
            .map(|p| self.log(p.id).highest_confirmed_frame())
            .min()
            .flatten()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    fn frames_ahead(&self) -> u64 {
        let next_unconfirmed = self.confirmed_frontier().map_or(0, |f| f + 1);
        self.frame.saturating_sub(next_unconfirmed)
    }

    fn capture_local(&mut self, local_input: I) -> Result<(), NetplayError> {
        let frame = self.frame;
        let local = self.local;
        let log = self
            .logs
            .get_mut(&local)
            .expect("roster validated at construction");
        let next = log.highest_confirmed_frame().map_or(0, |f| f + 1);
        if next != frame {
            // Retrying a stalled frame: already captured and sent.
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

    /// The input set for `frame`: confirmed where available, otherwise a
    /// fresh hold-last-known prediction, recorded in the log so a later
    /// confirmation can be checked against it.
    fn inputs_for(&mut self, frame: Frame) -> FrameInputs<I> {
        let mut inputs = FrameInputs::new();
        for player in &self.players {
            let log = self
                .logs
                .get_mut(&player.id)
                .expect("roster validated at construction");
            let (input, origin) = log.input_at(frame);
            if origin == InputOrigin::Predicted {
                log.record_predicted(frame, input.clone());
            }
            inputs.insert(player.id, input);
        }
        inputs
    }

    /// Restore the snapshot for `frame` and resimulate up to the current
    /// frame. Fatal if the snapshot was evicted, which can only happen when
    /// the channel broke its ordering guarantees.
    fn rollback_to(&mut self, frame: Frame) -> Result<(), NetplayError> {
        let Some(snapshot) = self.ring.get(frame) else {
            return Err(NetplayError::WindowExceeded {
                frame,
                oldest: self.ring.oldest_frame().unwrap_or(self.frame),
            });
        };
        debug!(from = frame, to = self.frame, "misprediction; resimulating");
        self.state = snapshot.clone();
        self.resimulate(frame);
        Ok(())
    }

    /// Step from `frame` to the current frame, overwriting ring entries as
    /// resimulation proceeds. `self.state` must hold the state at entry to
    /// `frame`.
    fn resimulate(&mut self, frame: Frame) {
        for f in frame..self.frame {
            let inputs = self.inputs_for(f);
            self.ring.overwrite(f, self.state.clone());
            self.state.step(&inputs);
        }
    }

    fn log(&self, player: PlayerId) -> &InputLog<I> {
        self.logs
            .get(&player)
            .expect("roster validated at construction")
    }
}

impl<S: SyncState<I>, I: GameInput> NetcodeEngine<I> for RollbackNetcode<S, I> {
    fn tick(&mut self, local_input: I) -> Result<TickOutcome, NetplayError> {
        RollbackNetcode::tick(self, local_input)
    }

    fn on_remote_input(
        &mut self,
        frame: Frame,
        player: PlayerId,
        input: I,
    ) -> Result<(), NetplayError> {
        RollbackNetcode::on_remote_input(self, frame, player, input)
    }

    fn on_state_sync(&mut self, frame: Frame, state: &[u8]) -> Result<(), NetplayError> {
        RollbackNetcode::on_state_sync(self, frame, state)
    }

    fn current_frame(&self) -> Frame {
        self.frame
    }

    fn should_stall(&self) -> bool {
        RollbackNetcode::should_stall(self)
    }

    fn state_bytes(&self) -> Result<Vec<u8>, NetplayError> {
        Ok(codec::encode_payload(&self.state)?)
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }
}

//! Per-player input logs.
//!
//! Each player has an append-only, frame-indexed log of inputs. Entries are
//! either **confirmed** (captured locally or received from the player's
//! peer) or **predicted** (synthesized by the rollback engine while the real
//! input was still in flight). Confirmed entries are immutable: a differing
//! confirmed value for an already-confirmed frame is a protocol violation,
//! not something to paper over.

use std::collections::BTreeMap;
use std::fmt::Debug;

use framelock_netproto::messages::{Frame, PlayerId};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::NetplayError;

/// One player's control state for one frame.
///
/// Opaque to the engine apart from three obligations: serializability (the
/// wire codec), equality (misprediction detection), and a default value
/// ("no input", used before anything is known about a player).
pub trait GameInput:
    Clone + PartialEq + Default + Debug + Serialize + DeserializeOwned
{
}

impl<T> GameInput for T where
    T: Clone + PartialEq + Default + Debug + Serialize + DeserializeOwned
{
}

/// Whether a log entry holds a real input or a synthesized one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    Confirmed,
    Predicted,
}

/// Result of feeding a remote confirmed input into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// No entry existed for this frame.
    NewlyConfirmed,
    /// An identical confirmed entry already existed (duplicate delivery).
    Duplicate,
    /// A predicted entry existed and matched the real input.
    PredictionConfirmed,
    /// A predicted entry existed and differed; the caller must resimulate
    /// if the frame was already stepped.
    Misprediction,
}

/// Append-only, frame-indexed record of one player's inputs.
#[derive(Debug, Clone)]
pub struct InputLog<I> {
    player: PlayerId,
    entries: BTreeMap<Frame, (I, InputOrigin)>,
    /// Highest frame of the gapless confirmed prefix starting at frame 0.
    confirmed_to: Option<Frame>,
    /// Most recent confirmed input, kept across pruning so the hold-last
    /// prediction policy survives eviction of old entries.
    last_confirmed: Option<(Frame, I)>,
}

impl<I: GameInput> InputLog<I> {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            entries: BTreeMap::new(),
            confirmed_to: None,
            last_confirmed: None,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Append a confirmed entry captured from the local player.
    ///
    /// Local capture is strictly monotonic: `frame` must be exactly one past
    /// the previous local entry. A violation is a bug in the driver, not a
    /// network condition, hence the assert.
    pub fn record_local(&mut self, frame: Frame, input: I) {
        let expected = self.confirmed_to.map_or(0, |f| f + 1);
        assert_eq!(
            frame, expected,
            "local input capture must be monotonic: got frame {frame}, expected {expected}"
        );
        self.note_confirmed(frame, &input);
        self.entries.insert(frame, (input, InputOrigin::Confirmed));
        self.advance_confirmed_prefix();
    }

    /// Record a confirmed entry received from the player's peer.
    ///
    /// A differing value over an existing confirmed entry is a
    /// [`NetplayError::InputConflict`]; over a predicted entry it is a
    /// misprediction, surfaced so the rollback engine can resimulate.
    pub fn record_remote(&mut self, frame: Frame, input: I) -> Result<RemoteOutcome, NetplayError> {
        let outcome = match self.entries.get(&frame) {
            Some((existing, InputOrigin::Confirmed)) => {
                if *existing != input {
                    return Err(NetplayError::InputConflict {
                        player: self.player,
                        frame,
                    });
                }
                return Ok(RemoteOutcome::Duplicate);
            }
            Some((existing, InputOrigin::Predicted)) => {
                if *existing == input {
                    RemoteOutcome::PredictionConfirmed
                } else {
                    RemoteOutcome::Misprediction
                }
            }
            None => RemoteOutcome::NewlyConfirmed,
        };

        self.note_confirmed(frame, &input);
        self.entries.insert(frame, (input, InputOrigin::Confirmed));
        self.advance_confirmed_prefix();
        Ok(outcome)
    }

    /// Remember a predicted value the engine is about to simulate with, so a
    /// later confirmed input can be checked against it.
    ///
    /// Overwriting an earlier prediction is fine (resimulation recomputes
    /// predictions); overwriting a confirmed entry is not.
    pub fn record_predicted(&mut self, frame: Frame, input: I) {
        debug_assert!(
            !self.is_confirmed(frame),
            "predicted entry must not overwrite a confirmed one"
        );
        self.entries.insert(frame, (input, InputOrigin::Predicted));
    }

    /// The input to use for `frame`: the confirmed entry if present,
    /// otherwise a prediction under the hold-last-known policy (the last
    /// confirmed input before `frame`, or the default if none exists yet).
    ///
    /// Predicted entries in the log are deliberately ignored here, so a
    /// prediction is always recomputed from the freshest confirmed data.
    pub fn input_at(&self, frame: Frame) -> (I, InputOrigin) {
        if let Some((input, InputOrigin::Confirmed)) = self.entries.get(&frame) {
            return (input.clone(), InputOrigin::Confirmed);
        }

        let held = self
            .entries
            .range(..frame)
            .rev()
            .find(|(_, (_, origin))| *origin == InputOrigin::Confirmed)
            .map(|(_, (input, _))| input.clone())
            .or_else(|| {
                self.last_confirmed
                    .as_ref()
                    .filter(|(f, _)| *f < frame)
                    .map(|(_, input)| input.clone())
            });

        (held.unwrap_or_default(), InputOrigin::Predicted)
    }

    /// Highest frame of the gapless confirmed prefix, i.e. every frame up to
    /// and including this one has a confirmed entry (or had one before it
    /// was pruned).
    pub fn highest_confirmed_frame(&self) -> Option<Frame> {
        self.confirmed_to
    }

    pub fn is_confirmed(&self, frame: Frame) -> bool {
        matches!(
            self.entries.get(&frame),
            Some((_, InputOrigin::Confirmed))
        ) || self.confirmed_to.is_some_and(|f| frame <= f)
    }

    /// Frames that currently hold predicted entries, ascending.
    pub fn predicted_frames(&self) -> impl Iterator<Item = Frame> + '_ {
        self.entries
            .iter()
            .filter(|(_, (_, origin))| *origin == InputOrigin::Predicted)
            .map(|(frame, _)| *frame)
    }

    /// Drop entries below `frame`. The last-confirmed cache survives, so
    /// prediction keeps working after eviction.
    pub fn prune_below(&mut self, frame: Frame) {
        self.entries = self.entries.split_off(&frame);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn note_confirmed(&mut self, frame: Frame, input: &I) {
        let newer = self.last_confirmed.as_ref().is_none_or(|(f, _)| frame >= *f);
        if newer {
            self.last_confirmed = Some((frame, input.clone()));
        }
    }

    fn advance_confirmed_prefix(&mut self) {
        // Walk forward from the known prefix end; entries arrive in frame
        // order per sender, so this is amortized O(1).
        let mut next = self.confirmed_to.map_or(0, |f| f + 1);
        while matches!(self.entries.get(&next), Some((_, InputOrigin::Confirmed))) {
            self.confirmed_to = Some(next);
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestInput = u8;

    #[test]
    fn local_capture_is_monotonic() {
        let mut log: InputLog<TestInput> = InputLog::new(0);
        log.record_local(0, 1);
        log.record_local(1, 2);
        assert_eq!(log.highest_confirmed_frame(), Some(1));
    }

    #[test]
    #[should_panic(expected = "monotonic")]
    fn local_capture_gap_panics() {
        let mut log: InputLog<TestInput> = InputLog::new(0);
        log.record_local(0, 1);
        log.record_local(2, 2);
    }

    #[test]
    fn remote_outcomes() {
        let mut log: InputLog<TestInput> = InputLog::new(1);

        assert_eq!(
            log.record_remote(0, 5).unwrap(),
            RemoteOutcome::NewlyConfirmed
        );
        assert_eq!(log.record_remote(0, 5).unwrap(), RemoteOutcome::Duplicate);

        log.record_predicted(1, 5);
        assert_eq!(
            log.record_remote(1, 5).unwrap(),
            RemoteOutcome::PredictionConfirmed
        );

        log.record_predicted(2, 5);
        assert_eq!(
            log.record_remote(2, 9).unwrap(),
            RemoteOutcome::Misprediction
        );
    }

    #[test]
    fn conflicting_confirmed_inputs_error() {
        let mut log: InputLog<TestInput> = InputLog::new(3);
        log.record_remote(0, 5).unwrap();

        let err = log.record_remote(0, 6).unwrap_err();
        assert!(matches!(
            err,
            NetplayError::InputConflict { player: 3, frame: 0 }
        ));
        // The original entry is untouched.
        assert_eq!(log.input_at(0), (5, InputOrigin::Confirmed));
    }

    #[test]
    fn prediction_defaults_before_any_input() {
        let log: InputLog<TestInput> = InputLog::new(1);
        assert_eq!(log.input_at(4), (0, InputOrigin::Predicted));
    }

    #[test]
    fn prediction_holds_last_known_input() {
        let mut log: InputLog<TestInput> = InputLog::new(1);
        log.record_remote(0, 7).unwrap();
        log.record_remote(1, 9).unwrap();

        assert_eq!(log.input_at(5), (9, InputOrigin::Predicted));

        // With a hole at frame 2, the prediction holds the confirmed input
        // before the hole even though a later frame is confirmed.
        log.record_remote(3, 4).unwrap();
        assert_eq!(log.input_at(2), (9, InputOrigin::Predicted));
    }

    #[test]
    fn prediction_ignores_predicted_entries() {
        let mut log: InputLog<TestInput> = InputLog::new(1);
        log.record_remote(0, 7).unwrap();
        log.record_predicted(1, 7);
        log.record_predicted(2, 7);

        // Frame 1's real input arrives; predictions for frame 3 must now
        // hold the newest confirmed value, not a stale predicted entry.
        log.record_remote(1, 2).unwrap();
        assert_eq!(log.input_at(3), (2, InputOrigin::Predicted));
    }

    #[test]
    fn confirmed_prefix_stops_at_holes() {
        let mut log: InputLog<TestInput> = InputLog::new(1);
        log.record_remote(0, 1).unwrap();
        log.record_remote(1, 1).unwrap();
        log.record_remote(3, 1).unwrap(); // frame 2 is a hole

        assert_eq!(log.highest_confirmed_frame(), Some(1));

        log.record_remote(2, 1).unwrap();
        assert_eq!(log.highest_confirmed_frame(), Some(3));
    }

    #[test]
    fn predicted_entries_do_not_extend_prefix() {
        let mut log: InputLog<TestInput> = InputLog::new(1);
        log.record_remote(0, 1).unwrap();
        log.record_predicted(1, 1);
        assert_eq!(log.highest_confirmed_frame(), Some(0));
    }

    #[test]
    fn prune_preserves_prediction_source() {
        let mut log: InputLog<TestInput> = InputLog::new(1);
        for frame in 0..10 {
            log.record_remote(frame, 40 + frame as u8).unwrap();
        }
        log.prune_below(8);

        assert_eq!(log.len(), 2);
        // Hold-last still sees the newest confirmed value.
        assert_eq!(log.input_at(20), (49, InputOrigin::Predicted));
        assert_eq!(log.highest_confirmed_frame(), Some(9));
    }

    #[test]
    fn predicted_frames_iterates_in_order() {
        let mut log: InputLog<TestInput> = InputLog::new(1);
        log.record_remote(0, 1).unwrap();
        log.record_predicted(2, 1);
        log.record_predicted(1, 1);

        let frames: Vec<Frame> = log.predicted_frames().collect();
        assert_eq!(frames, vec![1, 2]);
    }
}

use serde::{Deserialize, Serialize};

use crate::msg_id::MsgId;

/// Frame number: the sole ordering key for inputs, snapshots and state syncs.
/// Monotonically increasing, gapless in confirmed history.
pub type Frame = u64;

/// Dense per-session player identifier (0..player count).
pub type PlayerId = u8;

/// One player's serialized input for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InputMsg {
    pub frame: Frame,
    pub player: PlayerId,
    pub input: Vec<u8>,
}

/// The host's authoritative serialized simulation state at a frame boundary.
/// Advisory only; receivers must make progress without it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StateMsg {
    pub frame: Frame,
    pub state: Vec<u8>,
}

/// RTT probe. The receiver echoes `sent_ms` back verbatim in a [`PingResp`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReq {
    pub sent_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingResp {
    pub sent_ms: u64,
}

/// The four logical message kinds, decoded exactly once at the transport
/// boundary and matched exhaustively from there on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Input(InputMsg),
    State(StateMsg),
    PingReq(PingReq),
    PingResp(PingResp),
}

impl Message {
    pub fn msg_id(&self) -> MsgId {
        match self {
            Message::Input(_) => MsgId::Input,
            Message::State(_) => MsgId::State,
            Message::PingReq(_) => MsgId::PingReq,
            Message::PingResp(_) => MsgId::PingResp,
        }
    }
}

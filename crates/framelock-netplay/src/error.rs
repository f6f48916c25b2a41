//! Netplay error types.

use framelock_netproto::{
    error::WireError,
    messages::{Frame, PlayerId},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetplayError {
    /// Two different confirmed inputs were recorded for the same player and
    /// frame. Implies a non-deterministic sender or a transport ordering
    /// violation; fatal for this session.
    #[error("conflicting confirmed inputs for player {player} at frame {frame}")]
    InputConflict { player: PlayerId, frame: Frame },

    /// A correction targeted a frame older than the oldest retained
    /// snapshot. The session can no longer guarantee consistency.
    #[error("correction for frame {frame} is outside the retained window (oldest: {oldest})")]
    WindowExceeded { frame: Frame, oldest: Frame },

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("invalid session roster: {0}")]
    InvalidRoster(String),

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

//! Wire protocol for framelock netplay sessions.
//!
//! Defines the four logical message kinds exchanged between peers (input,
//! state, ping request/response), the framed codec that carries them over an
//! ordered byte channel, and the protocol error type. The transport itself
//! (connection setup, delivery, ordering) is supplied by the embedding
//! application.

pub mod codec;
pub mod constants;
pub mod error;
pub mod messages;
pub mod msg_id;

//! Transport-boundary dispatch.
//!
//! An [`Endpoint`] wraps an engine and owns everything that touches the wire
//! format: it decodes incoming bytes exactly once into the tagged message
//! kinds, routes inputs and state syncs to the engine, echoes ping probes
//! verbatim, and drives the outgoing ping and host state-sync cadences.
//!
//! Clocks never enter the engine; every entry point here takes `now_ms` from
//! the driver, which keeps the whole stack deterministic under test.

use std::marker::PhantomData;

use framelock_netproto::{
    codec,
    constants::PING_INTERVAL_MS,
    messages::{Message, PingReq, PingResp, StateMsg},
};
use tracing::warn;

use crate::{
    error::NetplayError,
    input::GameInput,
    rtt::RttEstimator,
    sink::MessageSink,
    sync::{NetcodeEngine, TickOutcome},
};

pub struct Endpoint<E, I> {
    engine: E,
    rtt: RttEstimator,
    sink: Box<dyn MessageSink>,
    last_ping_ms: Option<u64>,
    last_state_sync_ms: Option<u64>,
    state_syncs_sent: u64,
    _input: PhantomData<I>,
}

impl<E: NetcodeEngine<I>, I: GameInput> Endpoint<E, I> {
    pub fn new(engine: E, sink: Box<dyn MessageSink>) -> Self {
        Self {
            engine,
            rtt: RttEstimator::default(),
            sink,
            last_ping_ms: None,
            last_state_sync_ms: None,
            state_syncs_sent: 0,
            _input: PhantomData,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn rtt(&self) -> &RttEstimator {
        &self.rtt
    }

    pub fn state_syncs_sent(&self) -> u64 {
        self.state_syncs_sent
    }

    /// Drive one simulation tick. Call at the configured timestep.
    pub fn tick(&mut self, local_input: I) -> Result<TickOutcome, NetplayError> {
        self.engine.tick(local_input)
    }

    /// Handle one framed message from the channel.
    ///
    /// Undecodable bytes are logged and dropped, a local non-fatal
    /// condition. Protocol violations detected by the engine (input
    /// conflicts, window-exceeded corrections) are returned to the caller
    /// and end the session.
    pub fn handle_wire(&mut self, bytes: &[u8], now_ms: u64) -> Result<(), NetplayError> {
        let message = match codec::decode_frame(bytes) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "dropping undecodable message");
                return Ok(());
            }
        };
        self.handle_message(message, now_ms)
    }

    /// Route an already-decoded message.
    pub fn handle_message(&mut self, message: Message, now_ms: u64) -> Result<(), NetplayError> {
        match message {
            Message::Input(m) => match codec::decode_payload::<I>(&m.input) {
                Ok(input) => self.engine.on_remote_input(m.frame, m.player, input),
                Err(error) => {
                    warn!(
                        frame = m.frame,
                        player = m.player,
                        %error,
                        "dropping undecodable input payload"
                    );
                    Ok(())
                }
            },
            Message::State(m) => self.engine.on_state_sync(m.frame, &m.state),
            Message::PingReq(p) => {
                // Echoed verbatim; the sender computes the RTT.
                self.sink.send(Message::PingResp(PingResp {
                    sent_ms: p.sent_ms,
                }));
                Ok(())
            }
            Message::PingResp(p) => {
                self.rtt
                    .update(now_ms.saturating_sub(p.sent_ms) as f64);
                Ok(())
            }
        }
    }

    /// Run the periodic duties: RTT probes on a fixed interval, plus (on
    /// the host) advisory state broadcasts on the configured period.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), NetplayError> {
        let ping_due = self
            .last_ping_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= PING_INTERVAL_MS);
        if ping_due {
            self.sink
                .send(Message::PingReq(PingReq { sent_ms: now_ms }));
            self.last_ping_ms = Some(now_ms);
        }

        let config = *self.engine.config();
        if config.role.is_host() {
            if let Some(period) = config.state_sync_period {
                let due = self
                    .last_state_sync_ms
                    .is_none_or(|last| now_ms.saturating_sub(last) >= period.as_millis() as u64);
                if due {
                    let state = self.engine.state_bytes()?;
                    self.sink.send(Message::State(StateMsg {
                        frame: self.engine.current_frame(),
                        state,
                    }));
                    self.state_syncs_sent += 1;
                    self.last_state_sync_ms = Some(now_ms);
                }
            }
        }
        Ok(())
    }
}

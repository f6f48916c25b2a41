use std::time::Duration;

/// Authoritative role of this endpoint within the session.
///
/// The host is the source of advisory state syncs; clients receive and
/// apply them. Exactly one host exists per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }
}

/// Immutable per-session configuration, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Host or client.
    pub role: Role,

    /// The fixed timestep the driver ticks at. The engines never schedule
    /// anything themselves; this is exposed so the driver and diagnostics
    /// agree on the cadence.
    pub timestep: Duration,

    /// How many frames the rollback engine may run ahead of the confirmed
    /// frontier before it stalls. Bounds resimulation cost and snapshot
    /// memory. Ignored by lockstep.
    pub max_prediction_window: usize,

    /// Wall-clock period between authoritative state broadcasts (host only).
    /// `None` disables the state-sync channel.
    pub state_sync_period: Option<Duration>,
}

impl SessionConfig {
    /// 60 Hz timestep.
    pub const DEFAULT_TIMESTEP: Duration = Duration::from_micros(16_667);

    pub const DEFAULT_PREDICTION_WINDOW: usize = 10;

    pub const DEFAULT_STATE_SYNC_PERIOD: Duration = Duration::from_millis(1000);

    pub fn host() -> Self {
        Self {
            role: Role::Host,
            timestep: Self::DEFAULT_TIMESTEP,
            max_prediction_window: Self::DEFAULT_PREDICTION_WINDOW,
            state_sync_period: Some(Self::DEFAULT_STATE_SYNC_PERIOD),
        }
    }

    pub fn client() -> Self {
        Self {
            role: Role::Client,
            timestep: Self::DEFAULT_TIMESTEP,
            max_prediction_window: Self::DEFAULT_PREDICTION_WINDOW,
            state_sync_period: None,
        }
    }

    pub fn with_prediction_window(mut self, window: usize) -> Self {
        self.max_prediction_window = window;
        self
    }

    pub fn with_timestep(mut self, timestep: Duration) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_state_sync_period(mut self, period: Option<Duration>) -> Self {
        self.state_sync_period = period;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let host = SessionConfig::host();
        assert!(host.role.is_host());
        assert_eq!(host.max_prediction_window, 10);
        assert!(host.state_sync_period.is_some());

        let client = SessionConfig::client();
        assert!(!client.role.is_host());
        assert!(client.state_sync_period.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::host()
            .with_prediction_window(4)
            .with_state_sync_period(None);
        assert_eq!(config.max_prediction_window, 4);
        assert!(config.state_sync_period.is_none());
    }
}

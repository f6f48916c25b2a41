use framelock_netproto::messages::PlayerId;

use crate::{config::Role, error::NetplayError};

/// One participant in the session.
///
/// `local` marks the player controlled by this process; `host` marks the
/// authoritative peer for state syncs. Every endpoint in a session holds the
/// same roster, differing only in which entry is local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub local: bool,
    pub host: bool,
}

impl Player {
    pub fn new(id: PlayerId, local: bool, host: bool) -> Self {
        Self { id, local, host }
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn is_host(&self) -> bool {
        self.host
    }
}

/// Validate a roster against the configured role and return the local
/// player's id.
///
/// Requires: at least one player, unique ids, exactly one local player,
/// exactly one host, and the local player's host flag matching `role`.
pub(crate) fn validate_roster(players: &[Player], role: Role) -> Result<PlayerId, NetplayError> {
    if players.is_empty() {
        return Err(NetplayError::InvalidRoster("no players".into()));
    }

    for (i, a) in players.iter().enumerate() {
        for b in &players[i + 1..] {
            if a.id == b.id {
                return Err(NetplayError::InvalidRoster(format!(
                    "duplicate player id {}",
                    a.id
                )));
            }
        }
    }

    let locals: Vec<&Player> = players.iter().filter(|p| p.local).collect();
    let [local] = locals.as_slice() else {
        return Err(NetplayError::InvalidRoster(format!(
            "expected exactly one local player, found {}",
            locals.len()
        )));
    };

    let hosts = players.iter().filter(|p| p.host).count();
    if hosts != 1 {
        return Err(NetplayError::InvalidRoster(format!(
            "expected exactly one host, found {hosts}"
        )));
    }

    if local.host != role.is_host() {
        return Err(NetplayError::InvalidRoster(format!(
            "role {role:?} does not match local player host flag {}",
            local.host
        )));
    }

    Ok(local.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_players() -> Vec<Player> {
        vec![Player::new(0, true, true), Player::new(1, false, false)]
    }

    #[test]
    fn valid_roster_returns_local_id() {
        assert_eq!(validate_roster(&two_players(), Role::Host).unwrap(), 0);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let players = vec![Player::new(0, true, true), Player::new(0, false, false)];
        assert!(matches!(
            validate_roster(&players, Role::Host),
            Err(NetplayError::InvalidRoster(_))
        ));
    }

    #[test]
    fn exactly_one_local_required() {
        let players = vec![Player::new(0, true, true), Player::new(1, true, false)];
        assert!(validate_roster(&players, Role::Host).is_err());

        let players = vec![Player::new(0, false, true), Player::new(1, false, false)];
        assert!(validate_roster(&players, Role::Host).is_err());
    }

    #[test]
    fn exactly_one_host_required() {
        let players = vec![Player::new(0, true, true), Player::new(1, false, true)];
        assert!(validate_roster(&players, Role::Host).is_err());
    }

    #[test]
    fn role_must_match_local_host_flag() {
        assert!(validate_roster(&two_players(), Role::Client).is_err());

        let players = vec![Player::new(0, false, true), Player::new(1, true, false)];
        assert_eq!(validate_roster(&players, Role::Client).unwrap(), 1);
    }
}

//! Game and network state enums
//!
//! Both values are owned by a single coordinator instance; nothing here is
//! process-global.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the game
///
/// Every state is reachable from every other one. Only the side effect run on
/// entry differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Title screen, fresh layout
    Start,
    /// Active gameplay, physics advancing
    Run,
    /// Gameplay frozen, session saved
    Pause,
    /// Player destroyed, session discarded
    GameOver,
    /// Goal reached, session discarded
    Winning,
    /// Saved session restored, waiting to resume
    Loading,
}

impl GameState {
    /// All states, in declaration order
    pub const ALL: [GameState; 6] = [
        GameState::Start,
        GameState::Run,
        GameState::Pause,
        GameState::GameOver,
        GameState::Winning,
        GameState::Loading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Start => "start",
            GameState::Run => "run",
            GameState::Pause => "pause",
            GameState::GameOver => "game over",
            GameState::Winning => "winning",
            GameState::Loading => "loading",
        }
    }

    /// True for transitions a connected peer should hear about
    pub fn is_shared_with_peer(&self) -> bool {
        matches!(self, GameState::Pause | GameState::GameOver | GameState::Winning)
    }
}

/// Connection phase of the two-player peer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetState {
    /// No peer session configured
    #[default]
    Unset,
    /// Session exists but the transport is down
    Disconnected,
    /// Connect in progress
    Connecting,
    /// Transport up, nothing received from the peer yet
    Connected,
    /// At least one notice exchanged with the peer
    Synchronized,
}

impl NetState {
    /// True once the transport can carry notices
    pub fn is_online(&self) -> bool {
        matches!(self, NetState::Connected | NetState::Synchronized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pause_and_endings_reach_peer() {
        let shared: Vec<_> = GameState::ALL
            .iter()
            .filter(|s| s.is_shared_with_peer())
            .collect();
        assert_eq!(
            shared,
            vec![&GameState::Pause, &GameState::GameOver, &GameState::Winning]
        );
    }

    #[test]
    fn test_state_serializes_as_snake_case() {
        let json = serde_json::to_string(&GameState::GameOver).unwrap();
        assert_eq!(json, "\"game_over\"");
    }

    #[test]
    fn test_net_state_online() {
        assert!(!NetState::Unset.is_online());
        assert!(!NetState::Connecting.is_online());
        assert!(NetState::Connected.is_online());
        assert!(NetState::Synchronized.is_online());
    }
}

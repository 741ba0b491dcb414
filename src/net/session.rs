//! Peer session state and notice exchange

use serde::{Deserialize, Serialize};

use super::NetError;
use crate::sim::{GameState, NetState};

/// A state change announced to (or by) the remote peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNotice {
    pub session: String,
    pub state: GameState,
    /// Sender-local sequence number, starts at 1
    pub seq: u64,
}

/// Opaque channel to the remote peer
pub trait PeerTransport {
    fn connect(&mut self) -> Result<(), NetError>;
    fn send_state_notice(&mut self, notice: &StateNotice) -> Result<(), NetError>;
    /// Next pending notice, if any. Never blocks.
    fn receive_state_notice(&mut self) -> Result<Option<StateNotice>, NetError>;
}

/// Connection phase plus outbound sequencing for one peer
pub struct PeerSession {
    transport: Box<dyn PeerTransport>,
    state: NetState,
    next_seq: u64,
    sent: u64,
    received: u64,
}

impl PeerSession {
    pub fn new(transport: Box<dyn PeerTransport>) -> Self {
        Self {
            transport,
            state: NetState::Disconnected,
            next_seq: 1,
            sent: 0,
            received: 0,
        }
    }

    pub fn net_state(&self) -> NetState {
        self.state
    }

    pub fn connect(&mut self) -> Result<(), NetError> {
        self.state = NetState::Connecting;
        match self.transport.connect() {
            Ok(()) => {
                log::info!("Peer connected");
                self.state = NetState::Connected;
                Ok(())
            }
            Err(e) => {
                log::warn!("Peer connect failed: {}", e);
                self.state = NetState::Disconnected;
                Err(e)
            }
        }
    }

    /// Tell the peer about a committed local transition
    ///
    /// Only PAUSE/GAMEOVER/WINNING are forwarded, and only while online.
    /// Returns true when a notice went out.
    pub fn notify(&mut self, state: GameState, session: &str) -> bool {
        if !state.is_shared_with_peer() || !self.state.is_online() {
            return false;
        }
        let notice = StateNotice {
            session: session.to_string(),
            state,
            seq: self.next_seq,
        };
        match self.transport.send_state_notice(&notice) {
            Ok(()) => {
                log::debug!("Sent {:?} notice #{} to peer", state, notice.seq);
                self.next_seq += 1;
                self.sent += 1;
                true
            }
            Err(e) => {
                log::warn!("Peer notice failed, disconnecting: {}", e);
                self.state = NetState::Disconnected;
                false
            }
        }
    }

    /// Drain notices received from the peer
    pub fn poll(&mut self) -> Vec<StateNotice> {
        let mut notices = Vec::new();
        if !self.state.is_online() {
            return notices;
        }
        loop {
            match self.transport.receive_state_notice() {
                Ok(Some(notice)) => {
                    self.received += 1;
                    self.state = NetState::Synchronized;
                    notices.push(notice);
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Peer receive failed, disconnecting: {}", e);
                    self.state = NetState::Disconnected;
                    break;
                }
            }
        }
        notices
    }

    pub fn notices_sent(&self) -> u64 {
        self.sent
    }

    pub fn notices_received(&self) -> u64 {
        self.received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::LoopbackTransport;

    fn connected_pair() -> (PeerSession, LoopbackTransport) {
        let (local, remote) = LoopbackTransport::pair();
        let mut session = PeerSession::new(Box::new(local));
        session.connect().unwrap();
        (session, remote)
    }

    #[test]
    fn test_starts_disconnected() {
        let (local, _remote) = LoopbackTransport::pair();
        let session = PeerSession::new(Box::new(local));
        assert_eq!(session.net_state(), NetState::Disconnected);
    }

    #[test]
    fn test_only_shared_states_are_sent() {
        let (mut session, mut remote) = connected_pair();

        assert!(!session.notify(GameState::Run, "local"));
        assert!(!session.notify(GameState::Start, "local"));
        assert!(session.notify(GameState::Pause, "local"));
        assert!(session.notify(GameState::GameOver, "local"));

        let first = remote.receive_state_notice().unwrap().unwrap();
        let second = remote.receive_state_notice().unwrap().unwrap();
        assert_eq!(first.state, GameState::Pause);
        assert_eq!(first.seq, 1);
        assert_eq!(second.state, GameState::GameOver);
        assert_eq!(second.seq, 2);
        assert_eq!(remote.receive_state_notice().unwrap(), None);
    }

    #[test]
    fn test_offline_session_sends_nothing() {
        let (local, mut remote) = LoopbackTransport::pair();
        let mut session = PeerSession::new(Box::new(local));

        assert!(!session.notify(GameState::Pause, "local"));
        assert_eq!(remote.receive_state_notice().unwrap(), None);
    }

    #[test]
    fn test_receiving_synchronizes() {
        let (mut session, mut remote) = connected_pair();
        remote.connect().unwrap();
        remote
            .send_state_notice(&StateNotice {
                session: "local".to_string(),
                state: GameState::Winning,
                seq: 1,
            })
            .unwrap();

        let notices = session.poll();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].state, GameState::Winning);
        assert_eq!(session.net_state(), NetState::Synchronized);
        assert_eq!(session.notices_received(), 1);
    }

    #[test]
    fn test_dropped_peer_disconnects() {
        let (mut session, remote) = connected_pair();
        drop(remote);

        assert!(!session.notify(GameState::Pause, "local"));
        assert_eq!(session.net_state(), NetState::Disconnected);
    }
}

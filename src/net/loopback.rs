//! In-process peer transport
//!
//! Two endpoints joined by a pair of unbounded channels carrying encoded
//! notices. Useful for local two-player sessions and tests.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

use super::NetError;
use super::session::{PeerTransport, StateNotice};

pub struct LoopbackTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    connected: bool,
}

impl LoopbackTransport {
    /// Create both ends of a link
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();
        (
            Self {
                tx: a_tx,
                rx: a_rx,
                connected: false,
            },
            Self {
                tx: b_tx,
                rx: b_rx,
                connected: false,
            },
        )
    }
}

impl PeerTransport for LoopbackTransport {
    fn connect(&mut self) -> Result<(), NetError> {
        self.connected = true;
        Ok(())
    }

    fn send_state_notice(&mut self, notice: &StateNotice) -> Result<(), NetError> {
        if !self.connected {
            return Err(NetError::NotConnected);
        }
        let bytes = serde_json::to_vec(notice)?;
        self.tx.send(bytes).map_err(|_| NetError::Closed)
    }

    fn receive_state_notice(&mut self) -> Result<Option<StateNotice>, NetError> {
        match self.rx.try_recv() {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NetError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameState;

    #[test]
    fn test_send_requires_connect() {
        let (mut a, _b) = LoopbackTransport::pair();
        let notice = StateNotice {
            session: "local".to_string(),
            state: GameState::Pause,
            seq: 1,
        };
        assert!(matches!(
            a.send_state_notice(&notice),
            Err(NetError::NotConnected)
        ));
    }

    #[test]
    fn test_notices_cross_the_link() {
        let (mut a, mut b) = LoopbackTransport::pair();
        a.connect().unwrap();
        let notice = StateNotice {
            session: "local".to_string(),
            state: GameState::GameOver,
            seq: 3,
        };

        a.send_state_notice(&notice).unwrap();
        assert_eq!(b.receive_state_notice().unwrap(), Some(notice));
        assert_eq!(b.receive_state_notice().unwrap(), None);
        assert_eq!(a.receive_state_notice().unwrap(), None);
    }

    #[test]
    fn test_closed_link_reported() {
        let (mut a, b) = LoopbackTransport::pair();
        drop(b);
        assert!(matches!(a.receive_state_notice(), Err(NetError::Closed)));
    }
}

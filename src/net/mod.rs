//! Two-player peer session
//!
//! The session owns `NetState` and forwards selected local transitions to the
//! remote peer. The wire format is the transport's business; notices are
//! handed over as typed values.

pub mod loopback;
pub mod session;

pub use loopback::LoopbackTransport;
pub use session::{PeerSession, PeerTransport, StateNotice};

use thiserror::Error;

/// Errors raised by peer transports
#[derive(Debug, Error)]
pub enum NetError {
    #[error("peer transport is not connected")]
    NotConnected,

    #[error("peer channel closed")]
    Closed,

    #[error("notice encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}

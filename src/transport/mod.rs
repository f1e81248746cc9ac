pub mod isotp;
pub mod pdu;
pub mod raw;

use crate::error::Result;
use crate::types::CanId;
use std::time::Duration;

pub use isotp::{FlowControlParams, IsoTp, IsoTpConfig};
pub use raw::{RawConfig, RawFrames};

/// Per-call replacements for a transport's configured identifiers, modes and
/// timeout. `None` keeps the configured value.
///
/// `id` is the transmit identifier for `send` and the receive identifier for
/// `receive`. `reply_id` is the other half of the pair: where flow control is
/// expected during `send`, and where it is sent during `receive`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub id: Option<CanId>,
    pub reply_id: Option<CanId>,
    pub extended: Option<bool>,
    pub fd: Option<bool>,
    pub timeout: Option<Duration>,
}

impl Overrides {
    pub fn id(id: CanId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Identifier pair for one exchange, seen from the caller's side
    pub fn pair(id: CanId, reply_id: CanId) -> Self {
        Self {
            id: Some(id),
            reply_id: Some(reply_id),
            ..Default::default()
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

/// Payload-level transport the diagnostic client submits requests through
pub trait TransportLayer: Send {
    /// Sends a complete payload and returns the number of payload bytes sent.
    fn send(&mut self, payload: &[u8], overrides: &Overrides) -> Result<usize>;

    /// Blocks until a complete payload arrives or the timeout elapses.
    fn receive(&mut self, overrides: &Overrides) -> Result<Vec<u8>>;
}

impl<T: TransportLayer + ?Sized> TransportLayer for Box<T> {
    fn send(&mut self, payload: &[u8], overrides: &Overrides) -> Result<usize> {
        (**self).send(payload, overrides)
    }

    fn receive(&mut self, overrides: &Overrides) -> Result<Vec<u8>> {
        (**self).receive(overrides)
    }
}

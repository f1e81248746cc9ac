//! Physical layer boundary.
//!
//! The stack does not drive CAN hardware itself. Anything able to put a frame
//! on the bus and poll for received frames implements [`FrameTransport`]:
//! a SocketCAN socket, a USB adapter, a simulator, or the in-memory
//! [`mock::MockBus`] used by the tests.
//!
//! # Examples
//!
//! ```rust
//! use autodiag::physical::{mock::MockBus, FrameTransport};
//! use autodiag::types::FrameFlags;
//!
//! let mut bus = MockBus::default();
//! bus.send(0x7E0, FrameFlags::NONE, &[0x02, 0x10, 0x03]).unwrap();
//! assert_eq!(bus.sent().len(), 1);
//! assert!(bus.recv(0x7E8).unwrap().is_none());
//! ```

pub mod mock;

use crate::error::Result;
use crate::types::{CanId, Frame, FrameFlags};

/// Frame send/receive primitive that the transport layers are built on.
pub trait FrameTransport: Send {
    /// Transmits one frame and returns the number of data bytes put on the bus.
    ///
    /// `data` already has the length the caller wants on the wire (DLC bucket
    /// and padding are the caller's job).
    fn send(&mut self, id: CanId, flags: FrameFlags, data: &[u8]) -> Result<usize>;

    /// Non-blocking poll for the next received frame with identifier `id`.
    /// Returns `Ok(None)` when nothing is pending.
    fn recv(&mut self, id: CanId) -> Result<Option<Frame>>;
}

impl<T: FrameTransport + ?Sized> FrameTransport for Box<T> {
    fn send(&mut self, id: CanId, flags: FrameFlags, data: &[u8]) -> Result<usize> {
        (**self).send(id, flags, data)
    }

    fn recv(&mut self, id: CanId) -> Result<Option<Frame>> {
        (**self).recv(id)
    }
}

//! Client-side diagnostics over CAN and CAN-FD.
//!
//! The crate is layered the way the traffic flows:
//! - [`physical`]: the [`FrameTransport`](physical::FrameTransport) seam to a
//!   CAN interface, plus an in-memory bus
//! - [`transport`]: ISO 15765-2 segmentation (ISO-TP) and single-frame raw
//!   payloads
//! - [`application`]: the UDS (ISO 14229-1) client
//!
//! All timing goes through [`timer::Clock`].

pub mod application; // UDS client and service vocabulary
pub mod physical; // Frame I/O boundary and mock bus
pub mod transport; // ISO-TP and raw frame transports

// Re-exports for convenience
pub use application::{uds, vocabulary};
pub use transport::isotp;

// Common types and traits
pub mod error;
pub mod timer;
pub mod types;

pub use error::{DiagError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

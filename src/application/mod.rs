//! Application layer: the UDS (ISO 14229-1) diagnostic client.
//!
//! [`uds::UdsClient`] encodes service requests, hands them to any
//! [`TransportLayer`](crate::transport::TransportLayer) and matches the
//! answers. Response pending messages extend the wait, negative responses
//! come back as an unsuccessful [`uds::DiagnosticResult`].
//!
//! [`vocabulary`] names services and negative response codes for logs.
//!
//! # Examples
//!
//! ```rust
//! use autodiag::application::uds::{RequestOptions, SessionType, UdsClient, UdsConfig};
//! use autodiag::physical::mock::MockBus;
//! use autodiag::timer::ManualClock;
//! use autodiag::transport::{IsoTp, IsoTpConfig};
//! use autodiag::types::{Frame, FrameFlags};
//!
//! let clock = ManualClock::new();
//! let bus = MockBus::with_responder(
//!     clock.clone(),
//!     Box::new(|_request: &Frame| vec![Frame::new(0x718, FrameFlags::NONE, &[0x02, 0x50, 0x03])]),
//! );
//! let isotp = IsoTp::with_clock(IsoTpConfig::default(), bus, clock.clone()).unwrap();
//! let mut client = UdsClient::with_clock(UdsConfig::default(), isotp, clock).unwrap();
//!
//! let result = client
//!     .session_control(SessionType::Extended, &RequestOptions::default())
//!     .unwrap();
//! assert!(result.success);
//! assert_eq!(client.status().session, Some(0x03));
//! ```

pub mod uds;
pub mod vocabulary;

pub use uds::{DiagnosticResult, RequestOptions, UdsClient, UdsConfig};

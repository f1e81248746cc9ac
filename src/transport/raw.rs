//! Unsegmented transport: one payload per bus frame.
//!
//! Some tools and ECUs exchange diagnostic payloads that always fit a frame
//! without any ISO-TP framing. [`RawFrames`] sends the payload bytes as the
//! frame data and hands back the data of the next received frame.

use super::pdu;
use super::{Overrides, TransportLayer};
use crate::error::{DiagError, Result};
use crate::physical::FrameTransport;
use crate::timer::{Clock, Deadline, SystemClock};
use crate::types::{validate_id, CanId, Config, FrameFlags};
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct RawConfig {
    pub tx_id: CanId,
    pub rx_id: CanId,
    pub extended_id: bool,
    pub fd: bool,
    pub timeout: Duration,
    /// Fill for CAN-FD frames whose payload falls between two DLC buckets
    pub padding_value: u8,
    pub poll_interval: Duration,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            tx_id: 0x710,
            rx_id: 0x718,
            extended_id: false,
            fd: false,
            timeout: Duration::from_secs(2),
            padding_value: 0x00,
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl Config for RawConfig {
    fn validate(&self) -> Result<()> {
        validate_id("tx_id", self.tx_id, self.extended_id)?;
        validate_id("rx_id", self.rx_id, self.extended_id)?;
        if self.timeout.is_zero() || self.poll_interval.is_zero() {
            return Err(DiagError::Validation(
                "timeout and poll_interval must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

pub struct RawFrames<B: FrameTransport, C: Clock = SystemClock> {
    config: RawConfig,
    bus: B,
    clock: C,
}

impl<B: FrameTransport> RawFrames<B> {
    pub fn with_bus(config: RawConfig, bus: B) -> Result<Self> {
        Self::with_clock(config, bus, SystemClock::new())
    }
}

impl<B: FrameTransport, C: Clock> RawFrames<B, C> {
    pub fn with_clock(config: RawConfig, bus: B, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, bus, clock })
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

impl<B: FrameTransport, C: Clock> TransportLayer for RawFrames<B, C> {
    fn send(&mut self, payload: &[u8], overrides: &Overrides) -> Result<usize> {
        let id = overrides.id.unwrap_or(self.config.tx_id);
        let extended = overrides.extended.unwrap_or(self.config.extended_id);
        let fd = overrides.fd.unwrap_or(self.config.fd);
        validate_id("tx id", id, extended)?;

        let max = if fd {
            pdu::FD_FRAME_LEN
        } else {
            pdu::CLASSIC_FRAME_LEN
        };
        if payload.len() > max {
            return Err(DiagError::PayloadTooLarge {
                len: payload.len(),
                max,
            });
        }

        let mut data = payload.to_vec();
        if fd && payload.len() > pdu::CLASSIC_FRAME_LEN {
            if let Some(bucket) = pdu::dlc_bucket(payload.len()) {
                data.resize(bucket, self.config.padding_value);
            }
        }

        trace!(id, data = ?data, "tx raw frame");
        self.bus
            .send(id, FrameFlags::from_modes(extended, fd), &data)?;
        Ok(payload.len())
    }

    fn receive(&mut self, overrides: &Overrides) -> Result<Vec<u8>> {
        let rx_id = overrides.id.unwrap_or(self.config.rx_id);
        let timeout = overrides.timeout.unwrap_or(self.config.timeout);
        let deadline = Deadline::start(&self.clock, timeout);

        while !deadline.is_expired(&self.clock) {
            match self.bus.recv(rx_id)? {
                Some(frame) => {
                    trace!(id = rx_id, data = ?frame.data, "rx raw frame");
                    return Ok(frame.data);
                }
                None => self.clock.sleep(self.config.poll_interval),
            }
        }
        Err(DiagError::Timeout {
            waiting_for: "frame",
        })
    }
}

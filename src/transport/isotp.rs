use super::pdu::{self, FlowStatus, Pdu};
use super::{Overrides, TransportLayer};
use crate::error::{DiagError, Result};
use crate::physical::FrameTransport;
use crate::timer::{Clock, Deadline, SystemClock};
use crate::types::{validate_id, CanId, Config, Frame, FrameFlags};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// ISO-TP configuration
#[derive(Debug, Clone)]
pub struct IsoTpConfig {
    pub tx_id: CanId,
    pub rx_id: CanId,
    /// 29-bit identifiers
    pub extended_id: bool,
    /// CAN-FD framing
    pub fd: bool,
    /// Default for waiting on flow control and on received frames
    pub timeout: Duration,
    /// Block size advertised in the flow control frames we send (0 = unlimited)
    pub block_size: u8,
    /// STmin advertised in the flow control frames we send
    pub st_min: Duration,
    /// Pad classic frames to 8 bytes. CAN-FD frames are always padded to
    /// their DLC bucket.
    pub use_padding: bool,
    pub padding_value: u8,
    /// Abort reception on a consecutive frame with the wrong sequence number
    pub strict_sequence: bool,
    /// Flow control WAIT frames tolerated per flow control request
    pub max_wait_frames: u8,
    /// Sleep between polls that found no frame
    pub poll_interval: Duration,
    /// Largest payload accepted from a first frame. Longer transfers are
    /// refused with an overflow flow control.
    pub max_rx_len: usize,
}

impl Default for IsoTpConfig {
    fn default() -> Self {
        Self {
            tx_id: 0x710,
            rx_id: 0x718,
            extended_id: false,
            fd: false,
            timeout: Duration::from_secs(2),
            block_size: 0,
            st_min: Duration::ZERO,
            use_padding: true,
            padding_value: 0x00,
            strict_sequence: true,
            max_wait_frames: 10,
            poll_interval: Duration::from_millis(1),
            max_rx_len: 0x10_0000,
        }
    }
}

impl Config for IsoTpConfig {
    fn validate(&self) -> Result<()> {
        validate_id("tx_id", self.tx_id, self.extended_id)?;
        validate_id("rx_id", self.rx_id, self.extended_id)?;
        if self.timeout.is_zero() {
            return Err(DiagError::Validation("timeout must be nonzero".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(DiagError::Validation(
                "poll_interval must be nonzero".into(),
            ));
        }
        if self.max_rx_len == 0 {
            return Err(DiagError::Validation("max_rx_len must be nonzero".into()));
        }
        Ok(())
    }
}

/// Parameters announced by the receiver in a flow control frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControlParams {
    pub status: FlowStatus,
    pub block_size: u8,
    pub separation_time: Duration,
}

/// Resolved addressing for one transmission
#[derive(Debug, Clone, Copy)]
struct TxTarget {
    id: CanId,
    /// Where the peer's flow control arrives
    reply_id: CanId,
    flags: FrameFlags,
    timeout: Duration,
}

impl TxTarget {
    fn is_fd(&self) -> bool {
        self.flags.contains(FrameFlags::FD)
    }
}

/// State of one multi-frame reception
#[derive(Debug)]
struct Reassembly {
    buffer: Vec<u8>,
    remaining: usize,
    expected_sn: u8,
    block_count: u8,
}

impl Reassembly {
    fn new(declared: u32, first: &[u8]) -> Self {
        let declared = declared as usize;
        let take = first.len().min(declared);
        let mut buffer = Vec::with_capacity(declared);
        buffer.extend_from_slice(&first[..take]);
        Self {
            buffer,
            remaining: declared - take,
            expected_sn: 1,
            block_count: 0,
        }
    }

    fn push(&mut self, data: &[u8]) {
        let take = data.len().min(self.remaining);
        self.buffer.extend_from_slice(&data[..take]);
        self.remaining -= take;
        self.expected_sn = (self.expected_sn + 1) & 0x0F;
        self.block_count = self.block_count.wrapping_add(1);
    }

    fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// ISO-TP implementation
pub struct IsoTp<B: FrameTransport, C: Clock = SystemClock> {
    config: IsoTpConfig,
    bus: B,
    clock: C,
}

impl<B: FrameTransport> IsoTp<B> {
    /// Creates a new ISO-TP instance on top of the given bus
    pub fn with_bus(config: IsoTpConfig, bus: B) -> Result<Self> {
        Self::with_clock(config, bus, SystemClock::new())
    }
}

impl<B: FrameTransport, C: Clock> IsoTp<B, C> {
    /// Creates a new ISO-TP instance that reads time from `clock`
    pub fn with_clock(config: IsoTpConfig, bus: B, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, bus, clock })
    }

    pub fn config(&self) -> &IsoTpConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Sends `payload` as a single frame or as a segmented transfer, depending
    /// on its length and the framing mode.
    pub fn send(&mut self, payload: &[u8], overrides: &Overrides) -> Result<usize> {
        if payload.is_empty() {
            return Err(DiagError::Validation(
                "cannot send an empty payload".into(),
            ));
        }
        let target = self.resolve_target(overrides)?;
        let single_max = if target.is_fd() {
            pdu::FD_SF_MAX
        } else {
            pdu::CLASSIC_SF_MAX
        };

        if payload.len() <= single_max {
            self.write_pdu(&target, &Pdu::SingleFrame { data: payload })?;
            Ok(payload.len())
        } else {
            self.send_multi_frame(payload, &target)
        }
    }

    /// Waits for one complete payload on the receive identifier.
    ///
    /// Flow control goes to `overrides.reply_id`, or the configured `tx_id`.
    /// A flow control frame is returned raw, as it arrived.
    pub fn receive(&mut self, overrides: &Overrides) -> Result<Vec<u8>> {
        let rx_id = overrides.id.unwrap_or(self.config.rx_id);
        let peer = self.resolve_target(&Overrides {
            id: overrides.reply_id,
            reply_id: Some(rx_id),
            ..*overrides
        })?;
        let timeout = overrides.timeout.unwrap_or(self.config.timeout);
        let mut deadline = Deadline::start(&self.clock, timeout);
        let mut reassembly: Option<Reassembly> = None;

        loop {
            if deadline.is_expired(&self.clock) {
                return Err(DiagError::Timeout {
                    waiting_for: if reassembly.is_some() {
                        "consecutive frame"
                    } else {
                        "frame"
                    },
                });
            }
            let Some(frame) = self.poll(rx_id)? else {
                continue;
            };

            match pdu::decode(&frame.data) {
                Pdu::SingleFrame { data } => {
                    if reassembly.is_some() {
                        debug!("single frame interrupted a multi-frame reception");
                    }
                    return Ok(data.to_vec());
                }
                Pdu::FirstFrame { len, data } => {
                    let declared = len as usize;
                    if declared > pdu::FF_SHORT_MAX && !peer.is_fd() {
                        debug!(id = rx_id, len, "dropping 32-bit first frame on a classic bus");
                        continue;
                    }
                    if declared > self.config.max_rx_len {
                        warn!(
                            id = rx_id,
                            len,
                            max = self.config.max_rx_len,
                            "refusing oversized transfer"
                        );
                        self.send_flow_control(&peer, FlowStatus::Overflow)?;
                        return Err(DiagError::PayloadTooLarge {
                            len: declared,
                            max: self.config.max_rx_len,
                        });
                    }
                    debug!(id = rx_id, len, "first frame received");
                    self.send_flow_control(&peer, FlowStatus::ContinueToSend)?;
                    reassembly = Some(Reassembly::new(len, data));
                    deadline.restart(&self.clock);
                }
                Pdu::ConsecutiveFrame { sn, data } => {
                    let Some(state) = reassembly.as_mut() else {
                        debug!(sn, "ignoring consecutive frame outside a transfer");
                        continue;
                    };
                    if sn != state.expected_sn {
                        if self.config.strict_sequence {
                            return Err(DiagError::SequenceMismatch {
                                expected: state.expected_sn,
                                actual: sn,
                            });
                        }
                        warn!(
                            expected = state.expected_sn,
                            actual = sn,
                            "sequence number mismatch"
                        );
                    }
                    state.push(data);
                    deadline.restart(&self.clock);

                    if state.is_complete() {
                        let payload = std::mem::take(&mut state.buffer);
                        debug!(id = rx_id, len = payload.len(), "reassembly complete");
                        return Ok(payload);
                    }
                    if self.config.block_size != 0 && state.block_count == self.config.block_size
                    {
                        state.block_count = 0;
                        self.send_flow_control(&peer, FlowStatus::ContinueToSend)?;
                    }
                }
                Pdu::FlowControl { .. } => return Ok(frame.data.clone()),
                Pdu::Unrecognized => {
                    debug!(id = rx_id, data = ?frame.data, "dropping malformed frame");
                }
            }
        }
    }

    /// Waits for the next flow control frame on the configured receive identifier.
    pub fn wait_flow_control(&mut self, timeout: Duration) -> Result<FlowControlParams> {
        let rx_id = self.config.rx_id;
        self.flow_control_on(rx_id, timeout)
    }

    fn flow_control_on(&mut self, rx_id: CanId, timeout: Duration) -> Result<FlowControlParams> {
        let deadline = Deadline::start(&self.clock, timeout);

        loop {
            if deadline.is_expired(&self.clock) {
                return Err(DiagError::Timeout {
                    waiting_for: "flow control",
                });
            }
            let Some(frame) = self.poll(rx_id)? else {
                continue;
            };
            match pdu::decode(&frame.data) {
                Pdu::FlowControl {
                    status,
                    block_size,
                    st_min,
                } => {
                    let params = FlowControlParams {
                        status,
                        block_size,
                        separation_time: pdu::st_min_to_duration(st_min),
                    };
                    debug!(?params, "flow control received");
                    return Ok(params);
                }
                other => debug!(?other, "ignoring frame while waiting for flow control"),
            }
        }
    }

    /// Blocks until the receiver clears us to send, riding out WAIT frames.
    fn await_clearance(&mut self, target: &TxTarget) -> Result<FlowControlParams> {
        let mut waits = 0u8;
        loop {
            let params = self.flow_control_on(target.reply_id, target.timeout)?;
            match params.status {
                FlowStatus::ContinueToSend => return Ok(params),
                FlowStatus::Wait => {
                    waits += 1;
                    if waits > self.config.max_wait_frames {
                        return Err(DiagError::TooManyWaitFrames(self.config.max_wait_frames));
                    }
                }
                FlowStatus::Overflow => return Err(DiagError::FlowControlOverflow),
            }
        }
    }

    fn send_multi_frame(&mut self, payload: &[u8], target: &TxTarget) -> Result<usize> {
        let fd = target.is_fd();
        let max_len = if fd {
            u32::MAX as usize
        } else {
            pdu::FF_SHORT_MAX
        };
        if payload.len() > max_len {
            return Err(DiagError::PayloadTooLarge {
                len: payload.len(),
                max: max_len,
            });
        }

        let (first_len, cf_len) = match (fd, payload.len() > pdu::FF_SHORT_MAX) {
            (false, _) => (pdu::CLASSIC_FF_DATA, pdu::CLASSIC_CF_DATA),
            (true, false) => (pdu::FD_FF_DATA, pdu::FD_CF_DATA),
            (true, true) => (pdu::FD_FF_ESCAPE_DATA, pdu::FD_CF_DATA),
        };

        self.write_pdu(
            target,
            &Pdu::FirstFrame {
                len: payload.len() as u32,
                data: &payload[..first_len],
            },
        )?;

        let mut flow = self.await_clearance(target)?;
        let mut sn = 1u8;
        let mut in_block = 0usize;

        for chunk in payload[first_len..].chunks(cf_len) {
            if flow.block_size != 0 && in_block == flow.block_size as usize {
                flow = self.await_clearance(target)?;
                in_block = 0;
            }
            if in_block > 0 {
                self.clock.sleep(flow.separation_time);
            }
            self.write_pdu(target, &Pdu::ConsecutiveFrame { sn, data: chunk })?;
            sn = (sn + 1) & 0x0F;
            in_block += 1;
        }

        debug!(id = target.id, len = payload.len(), "multi-frame transfer sent");
        Ok(payload.len())
    }

    fn send_flow_control(&mut self, target: &TxTarget, status: FlowStatus) -> Result<()> {
        let pdu = Pdu::FlowControl {
            status,
            block_size: self.config.block_size,
            st_min: pdu::duration_to_st_min(self.config.st_min),
        };
        self.write_pdu(target, &pdu)?;
        Ok(())
    }

    fn write_pdu(&mut self, target: &TxTarget, pdu: &Pdu<'_>) -> Result<usize> {
        let mut data = pdu::encode(pdu)?;
        let frame_len = if target.is_fd() {
            pdu::dlc_bucket(data.len()).ok_or(DiagError::PayloadTooLarge {
                len: data.len(),
                max: pdu::FD_FRAME_LEN,
            })?
        } else if self.config.use_padding {
            pdu::CLASSIC_FRAME_LEN
        } else {
            data.len()
        };
        data.resize(frame_len, self.config.padding_value);

        trace!(id = target.id, data = ?data, "tx frame");
        self.bus.send(target.id, target.flags, &data)
    }

    fn poll(&mut self, id: CanId) -> Result<Option<Frame>> {
        match self.bus.recv(id)? {
            Some(frame) => {
                trace!(id, data = ?frame.data, "rx frame");
                Ok(Some(frame))
            }
            None => {
                self.clock.sleep(self.config.poll_interval);
                Ok(None)
            }
        }
    }

    fn resolve_target(&self, overrides: &Overrides) -> Result<TxTarget> {
        let id = overrides.id.unwrap_or(self.config.tx_id);
        let extended = overrides.extended.unwrap_or(self.config.extended_id);
        let fd = overrides.fd.unwrap_or(self.config.fd);
        validate_id("tx id", id, extended)?;
        Ok(TxTarget {
            id,
            reply_id: overrides.reply_id.unwrap_or(self.config.rx_id),
            flags: FrameFlags::from_modes(extended, fd),
            timeout: overrides.timeout.unwrap_or(self.config.timeout),
        })
    }
}

impl<B: FrameTransport, C: Clock> TransportLayer for IsoTp<B, C> {
    fn send(&mut self, payload: &[u8], overrides: &Overrides) -> Result<usize> {
        IsoTp::send(self, payload, overrides)
    }

    fn receive(&mut self, overrides: &Overrides) -> Result<Vec<u8>> {
        IsoTp::receive(self, overrides)
    }
}

use super::vocabulary;
use crate::error::{DiagError, Result};
use crate::timer::{Clock, Deadline, SystemClock};
use crate::transport::{Overrides, TransportLayer};
use crate::types::{validate_id, CanId, Config};
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace, warn};

// UDS Service IDs
pub const SID_DIAGNOSTIC_SESSION_CONTROL: u8 = 0x10;
pub const SID_ECU_RESET: u8 = 0x11;
pub const SID_READ_DATA_BY_ID: u8 = 0x22;
pub const SID_SECURITY_ACCESS: u8 = 0x27;
pub const SID_WRITE_DATA_BY_ID: u8 = 0x2E;
pub const SID_ROUTINE_CONTROL: u8 = 0x31;
pub const SID_REQUEST_DOWNLOAD: u8 = 0x34;
pub const SID_TRANSFER_DATA: u8 = 0x36;
pub const SID_REQUEST_TRANSFER_EXIT: u8 = 0x37;
pub const SID_TESTER_PRESENT: u8 = 0x3E;
pub const SID_CONTROL_DTC_SETTING: u8 = 0x85;

/// Added to the request SID in a positive response
pub const POSITIVE_RESPONSE_OFFSET: u8 = 0x40;
/// First byte of every negative response
pub const NEGATIVE_RESPONSE: u8 = 0x7F;

// UDS Negative Response Codes
pub const NRC_GENERAL_REJECT: u8 = 0x10;
pub const NRC_SERVICE_NOT_SUPPORTED: u8 = 0x11;
pub const NRC_SUB_FUNCTION_NOT_SUPPORTED: u8 = 0x12;
pub const NRC_CONDITIONS_NOT_CORRECT: u8 = 0x22;
pub const NRC_REQUEST_OUT_OF_RANGE: u8 = 0x31;
pub const NRC_SECURITY_ACCESS_DENIED: u8 = 0x33;
pub const NRC_INVALID_KEY: u8 = 0x35;
pub const NRC_RESPONSE_PENDING: u8 = 0x78;

/// Routine that erases a memory range
pub const ROUTINE_ERASE_MEMORY: u32 = 0xFF00;
/// addressAndLengthFormatIdentifier for 4 byte address and 4 byte size
pub const ADDRESS_AND_LENGTH_FORMAT: u8 = 0x44;

// UDS Session Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Default = 0x01,
    Programming = 0x02,
    Extended = 0x03,
    SafetySystem = 0x04,
}

impl From<SessionType> for u8 {
    fn from(session: SessionType) -> u8 {
        session as u8
    }
}

// UDS Reset Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    HardReset = 0x01,
    KeyOffOnReset = 0x02,
    SoftReset = 0x03,
    EnableRapidPowerShutdown = 0x04,
    DisableRapidPowerShutdown = 0x05,
}

impl TryFrom<u8> for ResetType {
    type Error = DiagError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(ResetType::HardReset),
            0x02 => Ok(ResetType::KeyOffOnReset),
            0x03 => Ok(ResetType::SoftReset),
            0x04 => Ok(ResetType::EnableRapidPowerShutdown),
            0x05 => Ok(ResetType::DisableRapidPowerShutdown),
            other => Err(DiagError::Validation(format!(
                "unknown reset type {:#04x}",
                other
            ))),
        }
    }
}

// RoutineControl sub-functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineControlType {
    Start = 0x01,
    Stop = 0x02,
    RequestResults = 0x03,
}

// ControlDTCSetting sub-functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtcSetting {
    On = 0x01,
    Off = 0x02,
}

/// UDS Configuration
#[derive(Debug, Clone)]
pub struct UdsConfig {
    /// Request identifier (tester to ECU)
    pub tx_id: CanId,
    /// Response identifier (ECU to tester)
    pub rx_id: CanId,
    pub extended_id: bool,
    pub fd: bool,
    /// Response timeout, restarted by every response pending
    pub timeout: Duration,
    /// Response timeout for erase and download requests
    pub programming_timeout: Duration,
    /// Response pending messages accepted per request
    pub max_pending_responses: u32,
    /// Upper bound on the whole exchange once the ECU starts answering pending
    pub pending_ceiling: Option<Duration>,
}

impl Default for UdsConfig {
    fn default() -> Self {
        Self {
            tx_id: 0x710,
            rx_id: 0x718,
            extended_id: false,
            fd: false,
            timeout: Duration::from_secs(2),
            programming_timeout: Duration::from_secs(5),
            max_pending_responses: 32,
            pending_ceiling: None,
        }
    }
}

impl Config for UdsConfig {
    fn validate(&self) -> Result<()> {
        validate_id("tx_id", self.tx_id, self.extended_id)?;
        validate_id("rx_id", self.rx_id, self.extended_id)?;
        if self.timeout.is_zero() || self.programming_timeout.is_zero() {
            return Err(DiagError::Validation("timeouts must be nonzero".into()));
        }
        Ok(())
    }
}

/// Per-request overrides of the client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub tx_id: Option<CanId>,
    pub rx_id: Option<CanId>,
    pub extended: Option<bool>,
    pub fd: Option<bool>,
    pub timeout: Option<Duration>,
    /// When false the request is sent and reported successful right away
    pub wait_response: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            tx_id: None,
            rx_id: None,
            extended: None,
            fd: None,
            timeout: None,
            wait_response: true,
        }
    }
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_ids(mut self, tx_id: CanId, rx_id: CanId) -> Self {
        self.tx_id = Some(tx_id);
        self.rx_id = Some(rx_id);
        self
    }

    pub fn without_response(mut self) -> Self {
        self.wait_response = false;
        self
    }
}

/// Outcome of one diagnostic request.
///
/// On success `payload` is the positive response past the echoed parameters.
/// On a negative response it starts at the rejected SID, followed by the NRC.
/// It is empty when nothing answered in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticResult {
    pub success: bool,
    pub payload: Vec<u8>,
}

impl DiagnosticResult {
    pub fn positive(payload: Vec<u8>) -> Self {
        Self {
            success: true,
            payload,
        }
    }

    pub fn negative(payload: Vec<u8>) -> Self {
        Self {
            success: false,
            payload,
        }
    }

    pub fn no_response() -> Self {
        Self::negative(Vec::new())
    }

    /// Negative response code, if the ECU rejected the request
    pub fn nrc(&self) -> Option<u8> {
        if self.success {
            return None;
        }
        self.payload.get(1).copied()
    }
}

impl fmt::Display for DiagnosticResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return write!(f, "positive response ({} bytes)", self.payload.len());
        }
        match (self.payload.first(), self.nrc()) {
            (Some(&sid), Some(nrc)) => write!(
                f,
                "{} rejected: {} ({:#04x})",
                vocabulary::service_info(sid).name,
                vocabulary::negative_response_info(nrc).name,
                nrc
            ),
            _ => write!(f, "no response"),
        }
    }
}

/// UDS Session Status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    /// Last session the ECU confirmed
    pub session: Option<u8>,
    /// Last security level unlocked with an accepted key
    pub security_level: Option<u8>,
}

/// One encoded request and where its answer is expected
#[derive(Debug, Clone)]
struct DiagnosticRequest {
    payload: Vec<u8>,
    response_offset: usize,
    /// Request direction: our identifier, flow control expected on the ECU's
    tx: Overrides,
    /// Response direction: the ECU's identifier, flow control sent to ours
    rx: Overrides,
    timeout: Duration,
    wait_response: bool,
}

impl DiagnosticRequest {
    fn service_id(&self) -> u8 {
        self.payload[0]
    }

    fn expected_positive(&self) -> u8 {
        self.service_id().wrapping_add(POSITIVE_RESPONSE_OFFSET)
    }
}

enum ResponseKind {
    Positive,
    Pending,
    Negative,
    Unrelated,
}

fn classify(data: &[u8], expected_positive: u8) -> ResponseKind {
    match data {
        [first, ..] if *first == expected_positive => ResponseKind::Positive,
        [NEGATIVE_RESPONSE, _, NRC_RESPONSE_PENDING, ..] => ResponseKind::Pending,
        [NEGATIVE_RESPONSE, _, _, ..] => ResponseKind::Negative,
        _ => ResponseKind::Unrelated,
    }
}

/// Identifier as the fewest big-endian bytes that hold it, at least one
pub fn minimal_be_bytes(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(3);
    bytes[skip..].to_vec()
}

fn address_and_size(address: u32, size: u32) -> [u8; 9] {
    let mut block = [0u8; 9];
    block[0] = ADDRESS_AND_LENGTH_FORMAT;
    block[1..5].copy_from_slice(&address.to_be_bytes());
    block[5..].copy_from_slice(&size.to_be_bytes());
    block
}

/// UDS client
pub struct UdsClient<T: TransportLayer, C: Clock = SystemClock> {
    config: UdsConfig,
    transport: T,
    clock: C,
    status: SessionStatus,
}

impl<T: TransportLayer> UdsClient<T> {
    /// Creates a new UDS client with the given transport layer
    pub fn with_transport(config: UdsConfig, transport: T) -> Result<Self> {
        Self::with_clock(config, transport, SystemClock::new())
    }
}

impl<T: TransportLayer, C: Clock> UdsClient<T, C> {
    pub fn with_clock(config: UdsConfig, transport: T, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            clock,
            status: SessionStatus::default(),
        })
    }

    pub fn config(&self) -> &UdsConfig {
        &self.config
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Changes the diagnostic session
    pub fn session_control(
        &mut self,
        session: impl Into<u8>,
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let session = session.into();
        let result = self.send_request(SID_DIAGNOSTIC_SESSION_CONTROL, &[session], 2, opts)?;
        if result.success && opts.wait_response {
            self.status.session = Some(session);
            self.status.security_level = None;
        }
        Ok(result)
    }

    /// Performs ECU reset
    pub fn ecu_reset(
        &mut self,
        reset: ResetType,
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let result = self.send_request(SID_ECU_RESET, &[reset as u8], 2, opts)?;
        if result.success && opts.wait_response {
            self.status = SessionStatus::default();
        }
        Ok(result)
    }

    /// Asks for the seed of an odd security access level
    pub fn request_seed(&mut self, level: u8, opts: &RequestOptions) -> Result<DiagnosticResult> {
        if level % 2 == 0 {
            return Err(DiagError::Validation(format!(
                "seed requests use odd access levels, got {:#04x}",
                level
            )));
        }
        self.send_request(SID_SECURITY_ACCESS, &[level], 2, opts)
    }

    /// Submits the key for an even security access level
    pub fn send_key(
        &mut self,
        level: u8,
        key: &[u8],
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        if level % 2 != 0 {
            return Err(DiagError::Validation(format!(
                "key submissions use even access levels, got {:#04x}",
                level
            )));
        }
        let mut params = Vec::with_capacity(1 + key.len());
        params.push(level);
        params.extend_from_slice(key);

        let result = self.send_request(SID_SECURITY_ACCESS, &params, 2, opts)?;
        if result.success && opts.wait_response {
            self.status.security_level = level.checked_sub(1);
        }
        Ok(result)
    }

    /// Sends tester present message
    pub fn tester_present(&mut self, opts: &RequestOptions) -> Result<DiagnosticResult> {
        self.send_request(SID_TESTER_PRESENT, &[0x00], 1, opts)
    }

    /// Reads data by identifier
    pub fn read_data_by_identifier(
        &mut self,
        id: u32,
        params: &[u8],
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let mut request = minimal_be_bytes(id);
        request.extend_from_slice(params);
        self.send_request(SID_READ_DATA_BY_ID, &request, 3, opts)
    }

    /// Writes data by identifier
    pub fn write_data_by_identifier(
        &mut self,
        id: u32,
        params: &[u8],
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let mut request = minimal_be_bytes(id);
        request.extend_from_slice(params);
        self.send_request(SID_WRITE_DATA_BY_ID, &request, 3, opts)
    }

    /// Performs routine control
    pub fn routine_control(
        &mut self,
        control: RoutineControlType,
        id: u32,
        params: &[u8],
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let mut request = vec![control as u8];
        request.extend(minimal_be_bytes(id));
        request.extend_from_slice(params);
        self.send_request(SID_ROUTINE_CONTROL, &request, 4, opts)
    }

    pub fn routine_start(
        &mut self,
        id: u32,
        params: &[u8],
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        self.routine_control(RoutineControlType::Start, id, params, opts)
    }

    pub fn routine_stop(&mut self, id: u32, opts: &RequestOptions) -> Result<DiagnosticResult> {
        self.routine_control(RoutineControlType::Stop, id, &[], opts)
    }

    pub fn routine_result(&mut self, id: u32, opts: &RequestOptions) -> Result<DiagnosticResult> {
        self.routine_control(RoutineControlType::RequestResults, id, &[], opts)
    }

    /// Erases `size` bytes at `address` through the erase memory routine
    pub fn erase_memory(
        &mut self,
        address: u32,
        size: u32,
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let opts = self.with_programming_timeout(opts);
        self.routine_start(ROUTINE_ERASE_MEMORY, &address_and_size(address, size), &opts)
    }

    /// Announces a download of `size` bytes to `address`
    pub fn request_download(
        &mut self,
        address: u32,
        size: u32,
        data_format: u8,
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let opts = self.with_programming_timeout(opts);
        let mut params = vec![data_format];
        params.extend_from_slice(&address_and_size(address, size));
        self.send_request(SID_REQUEST_DOWNLOAD, &params, 1, &opts)
    }

    pub fn transfer_data(
        &mut self,
        sequence: u8,
        data: &[u8],
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let mut params = Vec::with_capacity(1 + data.len());
        params.push(sequence);
        params.extend_from_slice(data);
        self.send_request(SID_TRANSFER_DATA, &params, 1, opts)
    }

    pub fn request_transfer_exit(&mut self, opts: &RequestOptions) -> Result<DiagnosticResult> {
        self.send_request(SID_REQUEST_TRANSFER_EXIT, &[], 1, opts)
    }

    pub fn control_dtc_setting(
        &mut self,
        setting: DtcSetting,
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        self.send_request(SID_CONTROL_DTC_SETTING, &[setting as u8], 2, opts)
    }

    /// Sends any service request. The positive response is returned from
    /// `response_offset` on, counted from the response SID.
    pub fn send_request(
        &mut self,
        service_id: u8,
        params: &[u8],
        response_offset: usize,
        opts: &RequestOptions,
    ) -> Result<DiagnosticResult> {
        let mut payload = Vec::with_capacity(1 + params.len());
        payload.push(service_id);
        payload.extend_from_slice(params);

        let tx_id = opts.tx_id.unwrap_or(self.config.tx_id);
        let rx_id = opts.rx_id.unwrap_or(self.config.rx_id);
        let timeout = opts.timeout.unwrap_or(self.config.timeout);
        let tx = Overrides {
            extended: Some(opts.extended.unwrap_or(self.config.extended_id)),
            fd: Some(opts.fd.unwrap_or(self.config.fd)),
            timeout: Some(timeout),
            ..Overrides::pair(tx_id, rx_id)
        };

        let request = DiagnosticRequest {
            payload,
            response_offset,
            tx,
            rx: Overrides {
                id: Some(rx_id),
                reply_id: Some(tx_id),
                ..tx
            },
            timeout,
            wait_response: opts.wait_response,
        };
        self.execute(&request)
    }

    /// Waits for the answer to a request whose positive response starts with
    /// `expected_positive`.
    ///
    /// A response pending restarts the timeout, but at most
    /// `max_pending_responses` times and within `pending_ceiling`. Past either
    /// limit the pending response itself is returned as the failure.
    ///
    /// Segmented responses are acknowledged on the configured `tx_id`.
    pub fn handle_response(
        &mut self,
        rx_id: CanId,
        expected_positive: u8,
        offset: usize,
        timeout: Duration,
    ) -> Result<DiagnosticResult> {
        let rx = Overrides {
            extended: Some(self.config.extended_id),
            fd: Some(self.config.fd),
            ..Overrides::pair(rx_id, self.config.tx_id)
        };
        self.await_response(rx, expected_positive, offset, timeout)
    }

    fn await_response(
        &mut self,
        rx: Overrides,
        expected_positive: u8,
        offset: usize,
        timeout: Duration,
    ) -> Result<DiagnosticResult> {
        let started = self.clock.now();
        let mut deadline = Deadline::start(&self.clock, timeout);
        let mut pending = 0u32;

        while !deadline.is_expired(&self.clock) {
            let overrides = Overrides {
                timeout: Some(deadline.remaining(&self.clock)),
                ..rx
            };
            let data = match self.transport.receive(&overrides) {
                Ok(data) => data,
                Err(err) if err.is_timeout() => continue,
                Err(err) => return Err(err),
            };

            match classify(&data, expected_positive) {
                ResponseKind::Positive => {
                    let payload = data.get(offset..).map(<[u8]>::to_vec).unwrap_or_default();
                    return Ok(DiagnosticResult::positive(payload));
                }
                ResponseKind::Pending => {
                    pending += 1;
                    let elapsed = self.clock.now().saturating_sub(started);
                    let over_ceiling = self
                        .config
                        .pending_ceiling
                        .is_some_and(|ceiling| elapsed >= ceiling);
                    if pending > self.config.max_pending_responses || over_ceiling {
                        warn!(pending, ?elapsed, "giving up on response pending");
                        return Ok(DiagnosticResult::negative(data[1..].to_vec()));
                    }
                    debug!(pending, "response pending, waiting");
                    deadline.restart(&self.clock);
                }
                ResponseKind::Negative => {
                    let result = DiagnosticResult::negative(data[1..].to_vec());
                    warn!("{}", result);
                    return Ok(result);
                }
                ResponseKind::Unrelated => {
                    trace!(data = ?data, "ignoring unrelated response");
                }
            }
        }

        debug!(rx_id = ?rx.id, "no response before timeout");
        Ok(DiagnosticResult::no_response())
    }

    fn execute(&mut self, request: &DiagnosticRequest) -> Result<DiagnosticResult> {
        debug!(
            service = vocabulary::service_info(request.service_id()).name,
            data = ?request.payload,
            "sending request"
        );
        self.transport.send(&request.payload, &request.tx)?;

        if !request.wait_response {
            return Ok(DiagnosticResult::positive(Vec::new()));
        }
        self.await_response(
            request.rx,
            request.expected_positive(),
            request.response_offset,
            request.timeout,
        )
    }

    fn with_programming_timeout(&self, opts: &RequestOptions) -> RequestOptions {
        RequestOptions {
            timeout: Some(opts.timeout.unwrap_or(self.config.programming_timeout)),
            ..*opts
        }
    }
}

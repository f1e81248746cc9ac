use autodiag::application::uds::{
    DtcSetting, RequestOptions, ResetType, SessionType, UdsClient, UdsConfig, NRC_INVALID_KEY,
    SID_ROUTINE_CONTROL,
};
use autodiag::error::DiagError;
use autodiag::physical::mock::MockBus;
use autodiag::timer::{Clock, ManualClock};
use autodiag::transport::{IsoTp, IsoTpConfig, RawConfig, RawFrames, TransportLayer};
use autodiag::types::{Frame, FrameFlags};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ECU_ID: u32 = 0x718;

type Handler = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn ecu_frame(data: &[u8]) -> Frame {
    Frame::new(ECU_ID, FrameFlags::NONE, data)
}

/// ECU side of classic ISO-TP: reassembles requests, segments answers and
/// holds consecutive frames back until the tester's flow control.
struct SimulatedEcu {
    handler: Handler,
    request: Vec<u8>,
    request_len: usize,
    held_back: Vec<Vec<u8>>,
}

impl SimulatedEcu {
    fn new(handler: Handler) -> Self {
        Self {
            handler,
            request: Vec::new(),
            request_len: 0,
            held_back: Vec::new(),
        }
    }

    fn on_frame(&mut self, frame: &Frame) -> Vec<Frame> {
        let data = &frame.data;
        match data[0] >> 4 {
            0x0 => {
                let len = (data[0] & 0x0F) as usize;
                let request = data[1..1 + len].to_vec();
                self.respond(&request)
            }
            0x1 => {
                self.request_len = (((data[0] & 0x0F) as usize) << 8) | data[1] as usize;
                self.request = data[2..].to_vec();
                vec![ecu_frame(&[0x30, 0x00, 0x00])]
            }
            0x2 => {
                self.request.extend_from_slice(&data[1..]);
                if self.request.len() < self.request_len {
                    return Vec::new();
                }
                let mut request = std::mem::take(&mut self.request);
                request.truncate(self.request_len);
                self.respond(&request)
            }
            0x3 => std::mem::take(&mut self.held_back)
                .iter()
                .map(|cf| ecu_frame(cf))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn respond(&mut self, request: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for payload in (self.handler)(request) {
            if payload.len() <= 7 {
                let mut single = vec![payload.len() as u8];
                single.extend_from_slice(&payload);
                frames.push(ecu_frame(&single));
                continue;
            }
            let mut first = vec![0x10 | (payload.len() >> 8) as u8, payload.len() as u8];
            first.extend_from_slice(&payload[..6]);
            frames.push(ecu_frame(&first));
            self.held_back = payload[6..]
                .chunks(7)
                .enumerate()
                .map(|(i, chunk)| {
                    let mut consecutive = vec![0x20 | ((i + 1) & 0x0F) as u8];
                    consecutive.extend_from_slice(chunk);
                    consecutive
                })
                .collect();
        }
        frames
    }
}

fn client_for(
    handler: Handler,
    clock: &ManualClock,
) -> UdsClient<IsoTp<MockBus, ManualClock>, ManualClock> {
    let mut ecu = SimulatedEcu::new(handler);
    let bus = MockBus::with_responder(
        clock.clone(),
        Box::new(move |frame: &Frame| ecu.on_frame(frame)),
    );
    let isotp = IsoTp::with_clock(IsoTpConfig::default(), bus, clock.clone()).unwrap();
    UdsClient::with_clock(UdsConfig::default(), isotp, clock.clone()).unwrap()
}

#[test]
fn test_full_stack_download_sequence() {
    init_logging();

    let image: Vec<u8> = (0..512u32).map(|i| (i * 7 % 251) as u8).collect();
    let flash = Arc::new(Mutex::new(Vec::new()));
    let ecu_flash = Arc::clone(&flash);

    let clock = ManualClock::new();
    let mut client = client_for(
        Box::new(move |request: &[u8]| match request[0] {
            0x10 => vec![vec![0x50, request[1], 0x00, 0x19, 0x01, 0xF4]],
            0x27 if request[1] == 0x01 => vec![vec![0x67, 0x01, 0x12, 0x34]],
            0x27 if request[2..] == [0x13, 0x35] => vec![vec![0x67, 0x02]],
            0x27 => vec![vec![0x7F, 0x27, 0x35]],
            0x85 => vec![vec![0xC5, request[1]]],
            0x31 => vec![
                vec![0x7F, 0x31, 0x78],
                vec![0x71, 0x01, 0xFF, 0x00, 0x00],
            ],
            0x34 => vec![vec![0x74, 0x20, 0x00, 0x82]],
            0x36 => {
                ecu_flash
                    .lock()
                    .unwrap()
                    .extend_from_slice(&request[2..]);
                vec![vec![0x76, request[1]]]
            }
            0x37 => vec![vec![0x77]],
            0x11 => vec![vec![0x51, request[1]]],
            _ => vec![vec![0x7F, request[0], 0x11]],
        }),
        &clock,
    );
    let opts = RequestOptions::default();

    let result = client
        .session_control(SessionType::Programming, &opts)
        .unwrap();
    assert!(result.success);
    assert_eq!(result.payload, vec![0x00, 0x19, 0x01, 0xF4]);

    let seed = client.request_seed(0x01, &opts).unwrap();
    assert_eq!(seed.payload, vec![0x12, 0x34]);
    let key: Vec<u8> = seed.payload.iter().map(|b| b + 1).collect();
    assert!(client.send_key(0x02, &key, &opts).unwrap().success);
    assert_eq!(client.status().session, Some(0x02));
    assert_eq!(client.status().security_level, Some(0x01));

    assert!(client
        .control_dtc_setting(DtcSetting::Off, &opts)
        .unwrap()
        .success);

    let erased = client
        .erase_memory(0x0800_0000, image.len() as u32, &opts)
        .unwrap();
    assert!(erased.success);

    let download = client
        .request_download(0x0800_0000, image.len() as u32, 0x00, &opts)
        .unwrap();
    assert_eq!(download.payload, vec![0x20, 0x00, 0x82]);
    let max_block = u16::from_be_bytes([download.payload[1], download.payload[2]]) as usize;

    for (i, chunk) in image.chunks(max_block - 2).enumerate() {
        let sequence = (i + 1) as u8;
        let result = client.transfer_data(sequence, chunk, &opts).unwrap();
        assert!(result.success);
        assert_eq!(result.payload, vec![sequence]);
    }
    assert!(client.request_transfer_exit(&opts).unwrap().success);
    assert!(client
        .ecu_reset(ResetType::HardReset, &opts)
        .unwrap()
        .success);

    assert_eq!(*flash.lock().unwrap(), image);
}

#[test]
fn test_full_stack_wrong_key() {
    let clock = ManualClock::new();
    let mut client = client_for(
        Box::new(|request: &[u8]| match request {
            [0x27, 0x01] => vec![vec![0x67, 0x01, 0xAA]],
            _ => vec![vec![0x7F, 0x27, 0x35]],
        }),
        &clock,
    );
    let opts = RequestOptions::default();

    client.request_seed(0x01, &opts).unwrap();
    let result = client.send_key(0x02, &[0x00], &opts).unwrap();
    assert!(!result.success);
    assert_eq!(result.nrc(), Some(NRC_INVALID_KEY));
    assert_eq!(client.status().security_level, None);
}

#[test]
fn test_full_stack_multi_frame_read() {
    init_logging();

    let clock = ManualClock::new();
    let mut client = client_for(
        Box::new(|request: &[u8]| {
            let mut response = vec![0x62, request[1], request[2]];
            response.extend_from_slice(b"WDB2030761A123456");
            vec![response]
        }),
        &clock,
    );

    let vin = client
        .read_data_by_identifier(0xF190, &[], &RequestOptions::default())
        .unwrap();
    assert!(vin.success);
    assert_eq!(vin.payload, b"WDB2030761A123456".to_vec());
}

#[test]
fn test_full_stack_response_pending_over_time() {
    let clock = ManualClock::new();
    let mut bus = MockBus::new(clock.clone());
    for at in [1500, 3000, 4500] {
        bus.push_rx_at(
            Duration::from_millis(at),
            ecu_frame(&[0x03, 0x7F, SID_ROUTINE_CONTROL, 0x78]),
        );
    }
    bus.push_rx_at(
        Duration::from_millis(6000),
        ecu_frame(&[0x05, 0x71, 0x01, 0x02, 0x03, 0x00]),
    );

    let isotp = IsoTp::with_clock(IsoTpConfig::default(), bus, clock.clone()).unwrap();
    let mut client = UdsClient::with_clock(UdsConfig::default(), isotp, clock.clone()).unwrap();

    let result = client
        .routine_start(0x0203, &[], &RequestOptions::default())
        .unwrap();
    assert!(result.success);
    assert_eq!(result.payload, vec![0x00]);
    assert!(clock.now() >= Duration::from_secs(6));
}

#[test]
fn test_full_stack_no_response() {
    let clock = ManualClock::new();
    let mut client = client_for(Box::new(|_: &[u8]| Vec::new()), &clock);

    let result = client.tester_present(&RequestOptions::default()).unwrap();
    assert!(!result.success);
    assert!(result.payload.is_empty());
}

#[test]
fn test_full_stack_bus_failure() {
    let clock = ManualClock::new();
    let mut bus = MockBus::new(clock.clone());
    bus.set_fail_sends(true);
    let isotp = IsoTp::with_clock(IsoTpConfig::default(), bus, clock.clone()).unwrap();
    let mut client = UdsClient::with_clock(UdsConfig::default(), isotp, clock).unwrap();

    let err = client
        .session_control(SessionType::Extended, &RequestOptions::default())
        .unwrap_err();
    assert!(matches!(err, DiagError::Bus(_)));
}

#[test]
fn test_uds_over_raw_frames() {
    let clock = ManualClock::new();
    let bus = MockBus::with_responder(
        clock.clone(),
        Box::new(|frame: &Frame| match frame.data.as_slice() {
            [0x10, session] => vec![ecu_frame(&[0x50, *session])],
            _ => Vec::new(),
        }),
    );
    let raw = RawFrames::with_clock(RawConfig::default(), bus, clock.clone()).unwrap();
    let transport: Box<dyn TransportLayer> = Box::new(raw);
    let mut client = UdsClient::with_clock(UdsConfig::default(), transport, clock).unwrap();

    let result = client
        .session_control(SessionType::Extended, &RequestOptions::default())
        .unwrap();
    assert!(result.success);
}

//! ISO-TP protocol control information: frame kind decoding, encoding, and
//! the CAN-FD data length buckets.

use crate::error::{DiagError, Result};
use std::time::Duration;

const SF_PCI: u8 = 0x00; // Single Frame
const FF_PCI: u8 = 0x10; // First Frame
const CF_PCI: u8 = 0x20; // Consecutive Frame
const FC_PCI: u8 = 0x30; // Flow Control

/// Classic CAN frame length
pub const CLASSIC_FRAME_LEN: usize = 8;
/// Largest CAN-FD frame length
pub const FD_FRAME_LEN: usize = 64;

/// Largest payload carried by a classic single frame
pub const CLASSIC_SF_MAX: usize = 7;
/// Largest payload carried by an escaped CAN-FD single frame
pub const FD_SF_MAX: usize = FD_FRAME_LEN - 2;
/// Largest length expressible in the 12-bit first frame field
pub const FF_SHORT_MAX: usize = 0xFFF;

/// Payload bytes carried by a classic first frame
pub const CLASSIC_FF_DATA: usize = CLASSIC_FRAME_LEN - 2;
/// Payload bytes carried by a CAN-FD first frame with a 12-bit length
pub const FD_FF_DATA: usize = FD_FRAME_LEN - 2;
/// Payload bytes carried by a CAN-FD first frame with a 32-bit length
pub const FD_FF_ESCAPE_DATA: usize = FD_FRAME_LEN - 6;

/// Payload bytes carried by a classic consecutive frame
pub const CLASSIC_CF_DATA: usize = CLASSIC_FRAME_LEN - 1;
/// Payload bytes carried by a CAN-FD consecutive frame
pub const FD_CF_DATA: usize = FD_FRAME_LEN - 1;

// Index = raw byte count, value = CAN-FD frame length that holds it
const DLC_BUCKETS: [u8; 65] = [
    8, 8, 8, 8, 8, 8, 8, 8, 8, // 0 - 8
    12, 12, 12, 12, // 9 - 12
    16, 16, 16, 16, // 13 - 16
    20, 20, 20, 20, // 17 - 20
    24, 24, 24, 24, // 21 - 24
    32, 32, 32, 32, 32, 32, 32, 32, // 25 - 32
    48, 48, 48, 48, 48, 48, 48, 48, 48, 48, 48, 48, 48, 48, 48, 48, // 33 - 48
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, // 49 - 64
];

/// Smallest CAN-FD frame length able to carry `len` bytes, `None` above 64.
pub fn dlc_bucket(len: usize) -> Option<usize> {
    DLC_BUCKETS.get(len).map(|&bucket| bucket as usize)
}

/// Flow control status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    ContinueToSend = 0x0,
    Wait = 0x1,
    Overflow = 0x2,
}

impl FlowStatus {
    fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(FlowStatus::ContinueToSend),
            0x1 => Some(FlowStatus::Wait),
            0x2 => Some(FlowStatus::Overflow),
            _ => None,
        }
    }
}

/// One decoded ISO-TP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu<'a> {
    SingleFrame {
        data: &'a [u8],
    },
    /// `data` is everything after the length field, padding included.
    FirstFrame {
        len: u32,
        data: &'a [u8],
    },
    ConsecutiveFrame {
        sn: u8,
        data: &'a [u8],
    },
    FlowControl {
        status: FlowStatus,
        block_size: u8,
        /// Raw STmin byte, see [`st_min_to_duration`].
        st_min: u8,
    },
    /// Unknown PCI, or a frame too short for the kind it claims.
    Unrecognized,
}

/// Classifies a frame by the high nibble of its first byte.
pub fn decode(data: &[u8]) -> Pdu<'_> {
    let Some(&pci) = data.first() else {
        return Pdu::Unrecognized;
    };

    match pci & 0xF0 {
        SF_PCI => {
            let len = (pci & 0x0F) as usize;
            if len == 0 {
                // CAN-FD escape: length lives in byte 1
                let Some(&len) = data.get(1) else {
                    return Pdu::Unrecognized;
                };
                let len = len as usize;
                if len == 0 || data.len() < 2 + len {
                    return Pdu::Unrecognized;
                }
                Pdu::SingleFrame {
                    data: &data[2..2 + len],
                }
            } else if len <= CLASSIC_SF_MAX && data.len() > len {
                Pdu::SingleFrame {
                    data: &data[1..=len],
                }
            } else {
                Pdu::Unrecognized
            }
        }
        FF_PCI => {
            if data.len() < 2 {
                return Pdu::Unrecognized;
            }
            let short = (((pci & 0x0F) as u32) << 8) | data[1] as u32;
            let (len, rest) = if short != 0 {
                (short, &data[2..])
            } else if data.len() >= 6 {
                let len = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
                // The 32-bit form is only valid for lengths the short form can't hold
                if len as usize <= FF_SHORT_MAX {
                    return Pdu::Unrecognized;
                }
                (len, &data[6..])
            } else {
                return Pdu::Unrecognized;
            };
            // A first frame always announces more than it carries
            if (len as usize) <= rest.len() {
                return Pdu::Unrecognized;
            }
            Pdu::FirstFrame { len, data: rest }
        }
        CF_PCI => {
            if data.len() < 2 {
                return Pdu::Unrecognized;
            }
            Pdu::ConsecutiveFrame {
                sn: pci & 0x0F,
                data: &data[1..],
            }
        }
        FC_PCI => {
            if data.len() < 3 {
                return Pdu::Unrecognized;
            }
            match FlowStatus::from_nibble(pci & 0x0F) {
                Some(status) => Pdu::FlowControl {
                    status,
                    block_size: data[1],
                    st_min: data[2],
                },
                None => Pdu::Unrecognized,
            }
        }
        _ => Pdu::Unrecognized,
    }
}

/// Encodes the PCI and data of a frame, without padding.
pub fn encode(pdu: &Pdu<'_>) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(FD_FRAME_LEN);
    match pdu {
        Pdu::SingleFrame { data } => {
            if data.is_empty() || data.len() > FD_SF_MAX {
                return Err(DiagError::Validation(format!(
                    "single frame cannot carry {} bytes",
                    data.len()
                )));
            }
            if data.len() <= CLASSIC_SF_MAX {
                buf.push(SF_PCI | data.len() as u8);
            } else {
                buf.push(SF_PCI);
                buf.push(data.len() as u8);
            }
            buf.extend_from_slice(data);
        }
        Pdu::FirstFrame { len, data } => {
            if *len as usize <= FF_SHORT_MAX {
                buf.push(FF_PCI | ((*len >> 8) as u8 & 0x0F));
                buf.push(*len as u8);
            } else {
                buf.push(FF_PCI);
                buf.push(0x00);
                buf.extend_from_slice(&len.to_be_bytes());
            }
            buf.extend_from_slice(data);
        }
        Pdu::ConsecutiveFrame { sn, data } => {
            buf.push(CF_PCI | (sn & 0x0F));
            buf.extend_from_slice(data);
        }
        Pdu::FlowControl {
            status,
            block_size,
            st_min,
        } => {
            buf.extend_from_slice(&[FC_PCI | *status as u8, *block_size, *st_min]);
        }
        Pdu::Unrecognized => {
            return Err(DiagError::Validation(
                "unrecognized frames cannot be encoded".into(),
            ))
        }
    }
    Ok(buf)
}

/// Converts an STmin byte to a delay. Reserved values map to the 127 ms
/// maximum, as ISO 15765-2 asks of a sender.
pub fn st_min_to_duration(raw: u8) -> Duration {
    match raw {
        0x00..=0x7F => Duration::from_millis(raw as u64),
        0xF1..=0xF9 => Duration::from_micros((raw as u64 - 0xF0) * 100),
        _ => Duration::from_millis(0x7F),
    }
}

/// Encodes a delay as an STmin byte, clamping to 127 ms.
pub fn duration_to_st_min(duration: Duration) -> u8 {
    let micros = duration.as_micros();
    if micros == 0 {
        return 0;
    }
    if micros < 1000 {
        // 100 us steps, rounded up so the peer never goes faster than asked
        let steps = micros.div_ceil(100);
        return if steps > 9 { 1 } else { 0xF0 + steps as u8 };
    }
    duration.as_millis().min(0x7F) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlc_bucket_is_monotonic_and_covers_length() {
        let mut previous = 0;
        for n in 0..=64 {
            let bucket = dlc_bucket(n).unwrap();
            assert!(bucket >= n, "bucket({n}) = {bucket}");
            assert!(bucket >= previous);
            assert_eq!(dlc_bucket(bucket), Some(bucket));
            previous = bucket;
        }
        assert_eq!(dlc_bucket(65), None);
    }

    #[test]
    fn dlc_bucket_boundaries() {
        assert_eq!(dlc_bucket(8), Some(8));
        assert_eq!(dlc_bucket(9), Some(12));
        assert_eq!(dlc_bucket(25), Some(32));
        assert_eq!(dlc_bucket(33), Some(48));
        assert_eq!(dlc_bucket(49), Some(64));
    }

    #[test]
    fn decode_classifies_by_high_nibble() {
        assert_eq!(
            decode(&[0x03, 0x22, 0xF1, 0x90, 0x00]),
            Pdu::SingleFrame {
                data: &[0x22, 0xF1, 0x90]
            }
        );
        assert!(matches!(
            decode(&[0x10, 0x14, 1, 2, 3, 4, 5, 6]),
            Pdu::FirstFrame { len: 20, .. }
        ));
        assert_eq!(
            decode(&[0x21, 7, 8]),
            Pdu::ConsecutiveFrame {
                sn: 1,
                data: &[7, 8]
            }
        );
        assert_eq!(
            decode(&[0x30, 0x04, 0x0A]),
            Pdu::FlowControl {
                status: FlowStatus::ContinueToSend,
                block_size: 4,
                st_min: 10
            }
        );
        assert_eq!(decode(&[0x40, 0x00, 0x00]), Pdu::Unrecognized);
        assert_eq!(decode(&[]), Pdu::Unrecognized);
    }

    #[test]
    fn decode_drops_frames_too_short_for_their_kind() {
        // SF claims 5 bytes, carries 2
        assert_eq!(decode(&[0x05, 0x01, 0x02]), Pdu::Unrecognized);
        assert_eq!(decode(&[0x10]), Pdu::Unrecognized);
        assert_eq!(decode(&[0x10, 0x00, 0x00]), Pdu::Unrecognized);
        assert_eq!(decode(&[0x21]), Pdu::Unrecognized);
        assert_eq!(decode(&[0x30, 0x00]), Pdu::Unrecognized);
        // reserved flow status
        assert_eq!(decode(&[0x33, 0x00, 0x00]), Pdu::Unrecognized);
    }

    #[test]
    fn escaped_single_frame_decodes() {
        let mut frame = vec![0x00, 10];
        frame.extend(1..=10u8);
        frame.resize(12, 0xCC);
        match decode(&frame) {
            Pdu::SingleFrame { data } => assert_eq!(data, &(1..=10u8).collect::<Vec<_>>()[..]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn escaped_first_frame_length() {
        let mut frame = vec![0x10, 0x00, 0x00, 0x00, 0x10, 0x00];
        frame.resize(64, 0xAB);
        match decode(&frame) {
            Pdu::FirstFrame { len, data } => {
                assert_eq!(len, 4096);
                assert_eq!(data.len(), FD_FF_ESCAPE_DATA);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn escaped_first_frame_with_short_length_is_dropped() {
        let mut frame = vec![0x10, 0x00, 0x00, 0x00, 0x0F, 0xFF];
        frame.resize(64, 0xAB);
        assert_eq!(decode(&frame), Pdu::Unrecognized);

        let mut frame = vec![0x10, 0x00, 0x00, 0x00, 0x00, 0x14];
        frame.resize(8, 0xAB);
        assert_eq!(decode(&frame), Pdu::Unrecognized);
    }

    #[test]
    fn encode_first_frame_length_fields() {
        let data = [0u8; 6];
        let short = encode(&Pdu::FirstFrame {
            len: 0xABC,
            data: &data,
        })
        .unwrap();
        assert_eq!(&short[..2], &[0x1A, 0xBC]);

        let long = encode(&Pdu::FirstFrame {
            len: 0x0001_0000,
            data: &data,
        })
        .unwrap();
        assert_eq!(&long[..6], &[0x10, 0x00, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn encode_single_frame_switches_to_escape_above_seven() {
        assert_eq!(
            encode(&Pdu::SingleFrame { data: &[1; 7] }).unwrap()[0],
            0x07
        );
        let escaped = encode(&Pdu::SingleFrame { data: &[1; 8] }).unwrap();
        assert_eq!(&escaped[..2], &[0x00, 0x08]);
        assert!(encode(&Pdu::SingleFrame { data: &[] }).is_err());
        assert!(encode(&Pdu::SingleFrame { data: &[0; 63] }).is_err());
    }

    #[test]
    fn st_min_conversions() {
        assert_eq!(st_min_to_duration(0x0A), Duration::from_millis(10));
        assert_eq!(st_min_to_duration(0xF3), Duration::from_micros(300));
        assert_eq!(st_min_to_duration(0x80), Duration::from_millis(127));
        assert_eq!(duration_to_st_min(Duration::from_micros(250)), 0xF3);
        assert_eq!(duration_to_st_min(Duration::from_millis(20)), 20);
        assert_eq!(duration_to_st_min(Duration::from_secs(1)), 0x7F);
        assert_eq!(duration_to_st_min(Duration::ZERO), 0);
    }
}

use bitflags::bitflags;

/// CAN ID type
pub type CanId = u32;

/// Generic frame data type
pub type FrameData = Vec<u8>;

/// Timestamp in milliseconds
pub type Timestamp = u64;

/// Largest 11-bit identifier
pub const STANDARD_ID_MAX: CanId = 0x7FF;
/// Largest 29-bit identifier
pub const EXTENDED_ID_MAX: CanId = 0x1FFF_FFFF;

bitflags! {
    /// Frame format flags carried alongside the identifier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameFlags: u8 {
        const NONE = 0;
        const EXTENDED_ID = 1 << 0; // 29-bit identifier
        const FD = 1 << 1;          // CAN-FD frame, up to 64 data bytes
    }
}

impl FrameFlags {
    pub fn from_modes(extended: bool, fd: bool) -> Self {
        let mut flags = FrameFlags::NONE;
        flags.set(FrameFlags::EXTENDED_ID, extended);
        flags.set(FrameFlags::FD, fd);
        flags
    }
}

/// Generic frame structure used across layers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub id: CanId,
    pub data: FrameData,
    pub timestamp: Timestamp,
    pub flags: FrameFlags,
}

impl Frame {
    pub fn new(id: CanId, flags: FrameFlags, data: &[u8]) -> Self {
        Self {
            id,
            data: data.to_vec(),
            timestamp: 0,
            flags,
        }
    }

    pub fn is_extended(&self) -> bool {
        self.flags.contains(FrameFlags::EXTENDED_ID)
    }

    pub fn is_fd(&self) -> bool {
        self.flags.contains(FrameFlags::FD)
    }
}

/// Configuration trait that must be implemented by all protocol configurations
pub trait Config: Send + Sync {
    fn validate(&self) -> crate::error::Result<()>;
}

/// Checks that an identifier fits the addressing mode it will be sent with.
pub(crate) fn validate_id(name: &str, id: CanId, extended: bool) -> crate::error::Result<()> {
    let max = if extended {
        EXTENDED_ID_MAX
    } else {
        STANDARD_ID_MAX
    };
    if id > max {
        return Err(crate::error::DiagError::Validation(format!(
            "{} {:#x} does not fit a {}-bit identifier",
            name,
            id,
            if extended { 29 } else { 11 }
        )));
    }
    Ok(())
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagError {
    // Physical layer errors
    #[error("bus error: {0}")]
    Bus(String),

    // Transport layer errors
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str },

    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("consecutive frame out of sequence: expected {expected:#x}, got {actual:#x}")]
    SequenceMismatch { expected: u8, actual: u8 },

    #[error("receiver reported flow control overflow")]
    FlowControlOverflow,

    #[error("receiver sent more than {0} flow control wait frames")]
    TooManyWaitFrames(u8),

    // Generic errors
    #[error("invalid parameter: {0}")]
    Validation(String),
}

impl DiagError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DiagError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, DiagError>;

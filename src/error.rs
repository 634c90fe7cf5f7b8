//! Error types for DCC encoder construction

use thiserror::Error;

/// Result type for DCC encoder operations
pub type Result<T> = std::result::Result<T, EncoderError>;

/// Errors reported while building an encoder or a transmit channel
///
/// Running an encoder never fails: a full symbol buffer is flow control
/// (see [`EncodeState::MemFull`](crate::EncodeState::MemFull)), not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncoderError {
    /// A configuration field is out of its legal range
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ConfigError),

    /// Symbol memory could not be reserved
    #[error("No memory: cannot reserve {requested} symbols")]
    NoMemory {
        /// Number of symbols that were requested
        requested: usize,
    },

    /// A serialized configuration could not be parsed
    #[cfg(feature = "serde")]
    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Configuration fields rejected at construction time
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Preamble length outside the protocol range
    #[error("preamble of {bits} bits outside [{min}, {max}]")]
    PreambleBits {
        /// Requested preamble length
        bits: usize,
        /// Legal minimum
        min: usize,
        /// Legal maximum
        max: usize,
    },

    /// "1" half-bit duration outside the transmit window
    #[error("bit 1 duration {duration}us outside [{min}, {max}]")]
    Bit1Duration {
        /// Requested duration
        duration: u16,
        /// Legal minimum
        min: u16,
        /// Legal maximum
        max: u16,
    },

    /// "0" half-bit duration outside the transmit window
    #[error("bit 0 duration {duration}us outside [{min}, {max}]")]
    Bit0Duration {
        /// Requested duration
        duration: u16,
        /// Legal minimum
        min: u16,
        /// Legal maximum
        max: u16,
    },

    /// End bit longer than the longest "1" half-bit
    #[error("end bit duration {duration}us exceeds {max}")]
    EndBitDuration {
        /// Requested duration
        duration: u16,
        /// Legal maximum
        max: u16,
    },

    /// BiDi cutout bit duration outside the cutout window
    #[error("BiDi bit duration {duration}us outside [{min}, {max}]")]
    BidiBitDuration {
        /// Requested duration
        duration: u16,
        /// Legal minimum
        min: u16,
        /// Legal maximum
        max: u16,
    },

    /// A transmit channel needs room for at least one symbol
    #[error("symbol memory block must hold at least one symbol")]
    EmptyMemBlock,
}

impl EncoderError {
    /// Create a new NoMemory error
    pub fn no_memory(requested: usize) -> Self {
        EncoderError::NoMemory { requested }
    }

    /// Create a new Malformed error
    #[cfg(feature = "serde")]
    pub fn malformed(msg: impl Into<String>) -> Self {
        EncoderError::Malformed(msg.into())
    }

    /// Whether the error was caused by the configuration rather than resources
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, EncoderError::InvalidArgument(_))
    }
}

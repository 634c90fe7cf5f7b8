//! # DCC Bitstream Encoder
//!
//! A Rust library that turns Digital Command Control (DCC) packets into the
//! timed track symbols a transmit peripheral plays out on the rails.
//!
//! DCC carries commands as polarity reversals of the track voltage. Every bit
//! cell is one symbol: two halves of equal length at opposite levels, short for
//! a "1" and long for a "0". This library provides:
//!
//! - Symbol derivation from a validated timing configuration
//! - A resumable packet encoder (BiDi cutout, sync zero, preamble, start, data, end)
//! - Bounded symbol memory with buffer-full backpressure
//! - A simulated transmit channel driving the encoder like a refill interrupt
//! - Receive-side packet reassembly from half-bit timings
//! - The decoder capability contract consumed on the receiving side
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of configurations
//!
//! ## Example
//!
//! ```
//! use dcc_encoder::{DccEncoder, EncodeState, EncoderConfig};
//!
//! let config = EncoderConfig::builder().preamble_bits(14).bidibit_duration(0).build()?;
//! let mut encoder = DccEncoder::new(&config)?;
//!
//! let mut symbols = Vec::new();
//! let encoded = encoder.encode(&mut symbols, &[0xFF]);
//! assert_eq!(encoded.state, EncodeState::Complete);
//! assert_eq!(symbols.len(), 24);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod channel;
pub mod config;
pub mod decoder;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod receiver;
pub mod sink;
pub mod symbol;

pub use channel::{packet_to_timings, ChannelConfig, TxChannel, TxStats};
pub use config::{EncoderConfig, EncoderConfigBuilder};
pub use emitter::{BitEmitter, ByteEmitter, Emit};
pub use encoder::{DccEncoder, EncodeState, Encoded, Phase};
pub use error::{ConfigError, EncoderError, Result};
pub use receiver::{Packet, Receiver};
pub use sink::{SymbolBuffer, SymbolSink};
pub use symbol::{Symbol, SymbolTable};

/// Timing and framing limits of the DCC physical layer (NMRA S-9.1/S-9.2, RCN-217)
///
/// All durations are half-bit lengths in microseconds.
pub mod limits {
    /// Minimum number of preamble bits a command station may send
    pub const MIN_PREAMBLE_BITS: usize = 14;

    /// Maximum number of preamble bits accepted by the encoder
    pub const MAX_PREAMBLE_BITS: usize = 30;

    /// Shortest half-bit of a transmitted "1"
    pub const MIN_BIT_1_TIMING: u16 = 56;

    /// Longest half-bit of a transmitted "1"
    pub const MAX_BIT_1_TIMING: u16 = 60;

    /// Shortest half-bit of a transmitted "0"
    pub const MIN_BIT_0_TIMING: u16 = 97;

    /// Longest half-bit of a transmitted "0"
    pub const MAX_BIT_0_TIMING: u16 = 114;

    /// Shortest half-bit timing used to pace the BiDi cutout
    pub const MIN_BIDI_BIT_TIMING: u16 = 57;

    /// Longest half-bit timing used to pace the BiDi cutout
    pub const MAX_BIDI_BIT_TIMING: u16 = 61;

    /// The RailCom cutout lasts eight BiDi half-bit periods (~464us at 58us)
    pub const CUTOUT_HALF_BITS: usize = 8;

    /// Every symbol carries two halves, so the cutout is four symbols long
    pub const CUTOUT_SYMBOLS: usize = CUTOUT_HALF_BITS / 2;

    /// Largest packet the receiver reassembles, in bytes
    pub const MAX_PACKET_SIZE: usize = 18;

    /// Number of preamble "1" bits a receiver needs before it accepts a start bit
    pub const RX_MIN_PREAMBLE_BITS: usize = 10;

    /// Shortest accepted "1" half-bit on the receiving side
    pub const RX_MIN_BIT_1_TIMING: u32 = 52;

    /// Longest accepted "1" half-bit on the receiving side
    pub const RX_MAX_BIT_1_TIMING: u32 = 64;

    /// Shortest accepted "0" half-bit on the receiving side
    pub const RX_MIN_BIT_0_TIMING: u32 = 90;

    /// Longest accepted "0" half-bit on the receiving side (stretched zero)
    pub const RX_MAX_BIT_0_TIMING: u32 = 10_000;
}

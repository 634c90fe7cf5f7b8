//! Resumable DCC packet encoder
//!
//! A packet goes out as a fixed sequence of phases:
//!
//! ```text
//! [cutout] [sync zero] preamble (start byte)* end
//! ```
//!
//! The encoder writes symbols until the sink is full, remembers the phase and
//! the progress inside it, and continues from exactly that point on the next
//! call. Symbols are never duplicated or skipped across calls, whatever the
//! size of the sink.

use log::{debug, trace};

use crate::config::EncoderConfig;
use crate::emitter::{BitEmitter, ByteEmitter, Emit};
use crate::error::Result;
use crate::limits::CUTOUT_SYMBOLS;
use crate::sink::SymbolSink;
use crate::symbol::SymbolTable;

/// Encoding state reported by encoders and emitters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeState {
    /// Nothing reported yet
    #[default]
    Reset,
    /// The input was fully encoded
    Complete,
    /// The sink ran out of room, call again once it has been drained
    MemFull,
}

/// Result of one [`DccEncoder::encode`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encoded {
    /// Symbols written by this call
    pub symbols: usize,
    /// `Complete` when the packet's end bit went out, `MemFull` otherwise
    pub state: EncodeState,
}

/// Position of the encoder within a packet
///
/// Phases carry their own progress, which restarts at zero in every phase.
/// `Start` and `Data` carry the index of the packet byte they work on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// BiDi cutout, `sent` cutout symbols so far
    Cutout { sent: usize },
    /// Optional "0" bit in front of the preamble
    SyncZero,
    /// Preamble, `sent` "1" bits so far
    Preamble { sent: usize },
    /// "0" separator in front of packet byte `byte`
    Start { byte: usize },
    /// Packet byte `byte`
    Data { byte: usize },
    /// Packet end bit
    End,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Cutout { sent } => write!(f, "Cutout({})", sent),
            Phase::SyncZero => write!(f, "SyncZero"),
            Phase::Preamble { sent } => write!(f, "Preamble({})", sent),
            Phase::Start { byte } => write!(f, "Start({})", byte),
            Phase::Data { byte } => write!(f, "Data({})", byte),
            Phase::End => write!(f, "End"),
        }
    }
}

/// What a phase handler decided
enum Step {
    /// The phase finished, continue with the given one
    Next(Phase),
    /// The sink is full, stay in the current phase
    Suspend,
}

struct Outcome {
    symbols: usize,
    step: Step,
}

impl Outcome {
    fn next(symbols: usize, phase: Phase) -> Self {
        Outcome {
            symbols,
            step: Step::Next(phase),
        }
    }

    fn suspend(symbols: usize) -> Self {
        Outcome {
            symbols,
            step: Step::Suspend,
        }
    }
}

/// DCC packet encoder for one transmit channel
///
/// Owns its bit and byte emitters. Calls must not overlap; `&mut self`
/// enforces that, the encoder itself holds no locks.
#[derive(Debug, Clone)]
pub struct DccEncoder {
    table: SymbolTable,
    preamble_bits: usize,
    sync_zero: bool,
    bit_emitter: BitEmitter,
    byte_emitter: ByteEmitter,
    phase: Phase,
}

impl DccEncoder {
    /// Create an encoder from a configuration
    ///
    /// Fails with [`EncoderError::InvalidArgument`](crate::EncoderError::InvalidArgument)
    /// if the configuration is out of range. The first packet starts at the
    /// sync zero phase, without a cutout in front of it.
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        let table = SymbolTable::new(config)?;
        debug!(
            "creating DCC encoder: preamble={} bit1={}us bit0={}us bidi={} sync_zero={}",
            config.preamble_bits,
            config.bit1_duration,
            config.bit0_duration,
            config.bidi_enabled(),
            config.sync_zero
        );

        Ok(DccEncoder {
            byte_emitter: ByteEmitter::new(&table),
            bit_emitter: BitEmitter::new(),
            table,
            preamble_bits: config.preamble_bits,
            sync_zero: config.sync_zero,
            phase: Phase::SyncZero,
        })
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Symbols used by this encoder
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Number of symbols one full cycle takes for a packet of `len` bytes
    ///
    /// Counts the cutout in front of the packet; the very first packet after
    /// construction or [`reset`](Self::reset) goes out without it.
    pub fn symbols_per_packet(&self, len: usize) -> usize {
        let cutout = if self.table.bidi.is_some() {
            CUTOUT_SYMBOLS
        } else {
            0
        };
        cutout + usize::from(self.sync_zero) + self.preamble_bits + len * 9 + 1
    }

    /// Encode `packet` into `sink`
    ///
    /// Returns [`EncodeState::Complete`] once the end bit was written; the
    /// encoder is then ready for the next packet. On
    /// [`EncodeState::MemFull`] call again with the same packet after the sink
    /// has been drained.
    pub fn encode<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, packet: &[u8]) -> Encoded {
        let mut symbols = 0;
        loop {
            let from = self.phase;
            let outcome = self.dispatch(sink, packet);
            symbols += outcome.symbols;

            match outcome.step {
                Step::Suspend => {
                    trace!("suspended in {} after {} symbols", self.phase, symbols);
                    return Encoded {
                        symbols,
                        state: EncodeState::MemFull,
                    };
                }
                Step::Next(next) => {
                    trace!("{} -> {}", from, next);
                    self.phase = next;
                    if from == Phase::End {
                        return Encoded {
                            symbols,
                            state: EncodeState::Complete,
                        };
                    }
                }
            }
        }
    }

    /// Abandon the current packet
    ///
    /// The next [`encode`](Self::encode) starts a new packet at the sync zero
    /// phase.
    pub fn reset(&mut self) {
        debug!("resetting DCC encoder in {}", self.phase);
        self.bit_emitter.reset();
        self.byte_emitter.reset();
        self.phase = Phase::SyncZero;
    }

    /// Tear the encoder down, releasing its emitters
    pub fn destroy(self) {
        debug!("destroying DCC encoder in {}", self.phase);
    }

    fn dispatch<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, packet: &[u8]) -> Outcome {
        match self.phase {
            Phase::Cutout { sent } => self.encode_cutout(sink, sent),
            Phase::SyncZero => self.encode_sync_zero(sink),
            Phase::Preamble { sent } => self.encode_preamble(sink, sent),
            Phase::Start { byte } => self.encode_start(sink, packet, byte),
            Phase::Data { byte } => self.encode_data(sink, packet, byte),
            Phase::End => self.encode_end(sink),
        }
    }

    fn encode_cutout<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, mut sent: usize) -> Outcome {
        let Some(bidi) = self.table.bidi else {
            return Outcome::next(0, Phase::SyncZero);
        };

        let mut symbols = 0;
        while sent < CUTOUT_SYMBOLS {
            let emit = self.bit_emitter.emit_bit(sink, bidi);
            symbols += emit.symbols;
            sent += emit.symbols;
            if !emit.is_complete() {
                self.phase = Phase::Cutout { sent };
                return Outcome::suspend(symbols);
            }
        }
        Outcome::next(symbols, Phase::SyncZero)
    }

    fn encode_sync_zero<S: SymbolSink + ?Sized>(&mut self, sink: &mut S) -> Outcome {
        if !self.sync_zero {
            return Outcome::next(0, Phase::Preamble { sent: 0 });
        }
        let emit = self.bit_emitter.emit_bit(sink, self.table.zero);
        Self::single(emit, Phase::Preamble { sent: 0 })
    }

    fn encode_preamble<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, mut sent: usize) -> Outcome {
        let mut symbols = 0;
        while sent < self.preamble_bits {
            let emit = self.bit_emitter.emit_bit(sink, self.table.one);
            symbols += emit.symbols;
            sent += emit.symbols;
            if !emit.is_complete() {
                self.phase = Phase::Preamble { sent };
                return Outcome::suspend(symbols);
            }
        }
        Outcome::next(symbols, Phase::Start { byte: 0 })
    }

    fn encode_start<S: SymbolSink + ?Sized>(
        &mut self,
        sink: &mut S,
        packet: &[u8],
        byte: usize,
    ) -> Outcome {
        // Nothing left to separate, an empty packet is just preamble and end bit
        if byte >= packet.len() {
            return Outcome::next(0, Phase::End);
        }
        let emit = self.bit_emitter.emit_bit(sink, self.table.zero);
        Self::single(emit, Phase::Data { byte })
    }

    fn encode_data<S: SymbolSink + ?Sized>(
        &mut self,
        sink: &mut S,
        packet: &[u8],
        byte: usize,
    ) -> Outcome {
        let Some(&value) = packet.get(byte) else {
            self.byte_emitter.reset();
            return Outcome::next(0, Phase::End);
        };

        let emit = self.byte_emitter.emit_byte(sink, value);
        if !emit.is_complete() {
            return Outcome::suspend(emit.symbols);
        }

        let next = byte + 1;
        if next < packet.len() {
            Outcome::next(emit.symbols, Phase::Start { byte: next })
        } else {
            Outcome::next(emit.symbols, Phase::End)
        }
    }

    fn encode_end<S: SymbolSink + ?Sized>(&mut self, sink: &mut S) -> Outcome {
        let emit = self.bit_emitter.emit_bit(sink, self.table.end);
        Self::single(emit, Phase::Cutout { sent: 0 })
    }

    fn single(emit: Emit, next: Phase) -> Outcome {
        if emit.is_complete() {
            Outcome::next(emit.symbols, next)
        } else {
            Outcome::suspend(emit.symbols)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SymbolBuffer;
    use crate::symbol::Symbol;

    fn plain_config() -> EncoderConfig {
        EncoderConfig::builder()
            .preamble_bits(14)
            .bit1_duration(58)
            .bit0_duration(100)
            .bidibit_duration(0)
            .build()
            .unwrap()
    }

    fn encode_chunked(encoder: &mut DccEncoder, packet: &[u8], capacity: usize) -> Vec<Symbol> {
        let mut buffer = SymbolBuffer::with_capacity(capacity).unwrap();
        let mut out = Vec::new();
        loop {
            let encoded = encoder.encode(&mut buffer, packet);
            assert_eq!(encoded.symbols, buffer.len());
            out.extend(buffer.drain());
            if encoded.state == EncodeState::Complete {
                return out;
            }
            assert_eq!(encoded.state, EncodeState::MemFull);
        }
    }

    #[test]
    fn test_initial_phase() {
        let encoder = DccEncoder::new(&EncoderConfig::default()).unwrap();
        assert_eq!(encoder.phase(), Phase::SyncZero);
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let config = EncoderConfig {
            preamble_bits: 2,
            ..EncoderConfig::default()
        };
        let err = DccEncoder::new(&config).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_single_byte_example() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        let mut symbols = Vec::new();
        let encoded = encoder.encode(&mut symbols, &[0xFF]);

        assert_eq!(encoded.state, EncodeState::Complete);
        assert_eq!(encoded.symbols, 24);

        let one = Symbol::bit(58, true);
        let zero = Symbol::bit(100, true);
        let mut expected = vec![one; 14];
        expected.push(zero);
        expected.extend([one; 8]);
        expected.push(Symbol::new(58, true, 58, false));
        assert_eq!(symbols, expected);
        assert_eq!(encoder.phase(), Phase::Cutout { sent: 0 });
    }

    #[test]
    fn test_framing_with_cutout_and_sync_zero() {
        let config = EncoderConfig::builder().sync_zero(true).build().unwrap();
        let mut encoder = DccEncoder::new(&config).unwrap();
        let table = *encoder.table();
        let bidi = table.bidi.unwrap();

        let mut first = Vec::new();
        encoder.encode(&mut first, &[0x03, 0x40]);
        // No cutout in front of the first packet
        assert_eq!(first.len(), encoder.symbols_per_packet(2) - CUTOUT_SYMBOLS);
        assert_eq!(first[0], table.zero);
        assert!(first[1..18].iter().all(|&s| s == table.one));

        let mut second = Vec::new();
        encoder.encode(&mut second, &[0x03, 0x40]);
        assert_eq!(second.len(), encoder.symbols_per_packet(2));
        assert_eq!(&second[..4], &[bidi; 4]);
        assert_eq!(second[4], table.zero);
        assert_eq!(&second[4..], &first[..]);
    }

    #[test]
    fn test_start_bit_before_every_byte() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        let table = *encoder.table();
        let mut symbols = Vec::new();
        encoder.encode(&mut symbols, &[0xFF, 0xFF, 0xFF]);

        let data = &symbols[14..symbols.len() - 1];
        assert_eq!(data.len(), 27);
        for chunk in data.chunks(9) {
            assert_eq!(chunk[0], table.zero);
            assert!(chunk[1..].iter().all(|&s| s == table.one));
        }
    }

    #[test]
    fn test_empty_packet() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        let mut symbols = Vec::new();
        let encoded = encoder.encode(&mut symbols, &[]);
        assert_eq!(encoded.state, EncodeState::Complete);
        assert_eq!(symbols.len(), 15);
    }

    #[test]
    fn test_full_sink_leaves_state_untouched() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        let mut buffer = SymbolBuffer::with_capacity(1).unwrap();
        buffer.try_push(Symbol::default());

        let encoded = encoder.encode(&mut buffer, &[0x12]);
        assert_eq!(encoded, Encoded { symbols: 0, state: EncodeState::MemFull });
        assert_eq!(encoder.phase(), Phase::Preamble { sent: 0 });
    }

    #[test]
    fn test_suspend_in_preamble() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        let mut buffer = SymbolBuffer::with_capacity(5).unwrap();

        let encoded = encoder.encode(&mut buffer, &[0x12]);
        assert_eq!(encoded, Encoded { symbols: 5, state: EncodeState::MemFull });
        assert_eq!(encoder.phase(), Phase::Preamble { sent: 5 });
    }

    #[test]
    fn test_suspend_mid_byte() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        // Preamble, start bit and three data bits
        let mut buffer = SymbolBuffer::with_capacity(18).unwrap();

        encoder.encode(&mut buffer, &[0xA5, 0x5A]);
        assert_eq!(encoder.phase(), Phase::Data { byte: 0 });
        assert_eq!(encoder.byte_emitter.bits_sent(), 3);
    }

    #[test]
    fn test_chunking_is_transparent() {
        let packet = [0x03, 0x3F, 0x80, 0xBC];
        let config = EncoderConfig::builder().sync_zero(true).build().unwrap();

        let mut reference = DccEncoder::new(&config).unwrap();
        let mut expected = Vec::new();
        reference.encode(&mut expected, &packet);
        expected.clear();
        reference.encode(&mut expected, &packet);

        for capacity in 1..=expected.len() {
            let mut encoder = DccEncoder::new(&config).unwrap();
            encode_chunked(&mut encoder, &packet, capacity);
            assert_eq!(encode_chunked(&mut encoder, &packet, capacity), expected);
        }
    }

    #[test]
    fn test_reset_abandons_packet() {
        let mut encoder = DccEncoder::new(&plain_config()).unwrap();
        let mut buffer = SymbolBuffer::with_capacity(20).unwrap();
        encoder.encode(&mut buffer, &[0xFF, 0x00]);
        assert_eq!(encoder.phase(), Phase::Data { byte: 0 });

        encoder.reset();
        assert_eq!(encoder.phase(), Phase::SyncZero);
        assert_eq!(encoder.byte_emitter.bits_sent(), 0);

        let mut fresh = DccEncoder::new(&plain_config()).unwrap();
        assert_eq!(
            encode_chunked(&mut encoder, &[0x01], 7),
            encode_chunked(&mut fresh, &[0x01], 64)
        );
    }

    #[test]
    fn test_symbols_per_packet() {
        let encoder = DccEncoder::new(&plain_config()).unwrap();
        assert_eq!(encoder.symbols_per_packet(1), 14 + 1 + 8 + 1);

        let config = EncoderConfig::builder().sync_zero(true).build().unwrap();
        let encoder = DccEncoder::new(&config).unwrap();
        assert_eq!(encoder.symbols_per_packet(3), 4 + 1 + 17 + 27 + 1);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Preamble { sent: 3 }.to_string(), "Preamble(3)");
        assert_eq!(Phase::End.to_string(), "End");
    }

    #[test]
    fn test_destroy() {
        let encoder = DccEncoder::new(&plain_config()).unwrap();
        encoder.destroy();
    }
}

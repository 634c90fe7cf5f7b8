//! Bit and byte emitters feeding symbols into a sink

use crate::encoder::EncodeState;
use crate::sink::SymbolSink;
use crate::symbol::{Symbol, SymbolTable};

/// Outcome of one emitter call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emit {
    /// Symbols written by this call
    pub symbols: usize,
    /// `Complete` once everything was written, `MemFull` if the sink ran out of room
    pub state: EncodeState,
}

impl Emit {
    fn complete(symbols: usize) -> Self {
        Emit {
            symbols,
            state: EncodeState::Complete,
        }
    }

    fn mem_full(symbols: usize) -> Self {
        Emit {
            symbols,
            state: EncodeState::MemFull,
        }
    }

    /// Check if the emitter finished its input
    pub fn is_complete(&self) -> bool {
        self.state == EncodeState::Complete
    }
}

/// Copies whole symbols into a sink
///
/// The copy primitive remembers how far into its input it got, so a call
/// interrupted by a full sink is retried with the same input and continues
/// where it stopped.
#[derive(Debug, Clone, Default)]
pub struct BitEmitter {
    copied: usize,
}

impl BitEmitter {
    /// Create a new bit emitter
    pub fn new() -> Self {
        BitEmitter { copied: 0 }
    }

    /// Copy a run of symbols
    pub fn copy<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, symbols: &[Symbol]) -> Emit {
        let mut written = 0;
        while let Some(&symbol) = symbols.get(self.copied) {
            if !sink.try_push(symbol) {
                return Emit::mem_full(written);
            }
            self.copied += 1;
            written += 1;
        }
        self.copied = 0;
        Emit::complete(written)
    }

    /// Write exactly one symbol
    pub fn emit_bit<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, symbol: Symbol) -> Emit {
        self.copy(sink, std::slice::from_ref(&symbol))
    }

    /// Forget any partially copied input
    pub fn reset(&mut self) {
        self.copied = 0;
    }
}

/// Encodes payload bytes most significant bit first
#[derive(Debug, Clone)]
pub struct ByteEmitter {
    one: Symbol,
    zero: Symbol,
    /// Next bit to send, 0 is the MSB
    bit: u8,
}

impl ByteEmitter {
    /// Create a byte emitter using the table's "1" and "0" symbols
    pub fn new(table: &SymbolTable) -> Self {
        ByteEmitter {
            one: table.one,
            zero: table.zero,
            bit: 0,
        }
    }

    /// Write the bits of `byte` that have not been sent yet
    pub fn emit_byte<S: SymbolSink + ?Sized>(&mut self, sink: &mut S, byte: u8) -> Emit {
        let mut written = 0;
        while self.bit < 8 {
            let symbol = if byte & (0x80 >> self.bit) != 0 {
                self.one
            } else {
                self.zero
            };
            if !sink.try_push(symbol) {
                return Emit::mem_full(written);
            }
            self.bit += 1;
            written += 1;
        }
        self.bit = 0;
        Emit::complete(written)
    }

    /// Number of bits of the current byte already sent
    pub fn bits_sent(&self) -> u8 {
        self.bit
    }

    /// Restart at the MSB of the next byte
    pub fn reset(&mut self) {
        self.bit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderConfig;
    use crate::sink::SymbolBuffer;

    fn table() -> SymbolTable {
        SymbolTable::new(&EncoderConfig::default()).unwrap()
    }

    #[test]
    fn test_emit_bit() {
        let mut emitter = BitEmitter::new();
        let mut sink = Vec::new();
        let emit = emitter.emit_bit(&mut sink, Symbol::bit(58, true));
        assert_eq!(emit, Emit::complete(1));
        assert_eq!(sink, vec![Symbol::bit(58, true)]);
    }

    #[test]
    fn test_emit_bit_full_then_retry() {
        let mut emitter = BitEmitter::new();
        let mut sink = SymbolBuffer::with_capacity(1).unwrap();
        sink.try_push(Symbol::bit(100, true));

        let emit = emitter.emit_bit(&mut sink, Symbol::bit(58, true));
        assert_eq!(emit, Emit::mem_full(0));

        sink.clear();
        let emit = emitter.emit_bit(&mut sink, Symbol::bit(58, true));
        assert!(emit.is_complete());
        assert_eq!(sink.as_slice(), &[Symbol::bit(58, true)]);
    }

    #[test]
    fn test_copy_resumes() {
        let symbols = [Symbol::bit(58, true), Symbol::bit(100, true), Symbol::bit(57, true)];
        let mut emitter = BitEmitter::new();
        let mut sink = SymbolBuffer::with_capacity(2).unwrap();

        assert_eq!(emitter.copy(&mut sink, &symbols), Emit::mem_full(2));
        let mut out: Vec<Symbol> = sink.drain().collect();
        assert_eq!(emitter.copy(&mut sink, &symbols), Emit::complete(1));
        out.extend(sink.drain());
        assert_eq!(out, symbols);
    }

    #[test]
    fn test_emit_byte_msb_first() {
        let table = table();
        let mut emitter = ByteEmitter::new(&table);
        let mut sink = Vec::new();
        let emit = emitter.emit_byte(&mut sink, 0b1010_0001);
        assert_eq!(emit, Emit::complete(8));

        let (one, zero) = (table.one, table.zero);
        assert_eq!(sink, vec![one, zero, one, zero, zero, zero, zero, one]);
    }

    #[test]
    fn test_emit_byte_resumes_mid_byte() {
        let table = table();
        let mut emitter = ByteEmitter::new(&table);
        let mut sink = SymbolBuffer::with_capacity(3).unwrap();

        assert_eq!(emitter.emit_byte(&mut sink, 0xF0), Emit::mem_full(3));
        assert_eq!(emitter.bits_sent(), 3);
        let mut out: Vec<Symbol> = sink.drain().collect();

        assert_eq!(emitter.emit_byte(&mut sink, 0xF0), Emit::mem_full(3));
        out.extend(sink.drain());
        assert_eq!(emitter.emit_byte(&mut sink, 0xF0), Emit::complete(2));
        out.extend(sink.drain());

        let expected: Vec<Symbol> = [table.one; 4].into_iter().chain([table.zero; 4]).collect();
        assert_eq!(out, expected);
        assert_eq!(emitter.bits_sent(), 0);
    }

    #[test]
    fn test_byte_reset() {
        let table = table();
        let mut emitter = ByteEmitter::new(&table);
        let mut sink = SymbolBuffer::with_capacity(5).unwrap();
        emitter.emit_byte(&mut sink, 0x00);
        emitter.reset();
        assert_eq!(emitter.bits_sent(), 0);
    }
}

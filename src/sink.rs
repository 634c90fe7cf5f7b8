//! Symbol memory the encoders copy into

use crate::error::{EncoderError, Result};
use crate::symbol::Symbol;

/// Destination of encoded symbols
///
/// Implementations must be callable from interrupt context: no blocking and no
/// allocation once constructed.
pub trait SymbolSink {
    /// Store one symbol, returning `false` when there is no room for it
    fn try_push(&mut self, symbol: Symbol) -> bool;
}

/// Unbounded sink, used when a whole packet is rendered at once
impl SymbolSink for Vec<Symbol> {
    fn try_push(&mut self, symbol: Symbol) -> bool {
        self.push(symbol);
        true
    }
}

/// Fixed-size block of symbol memory
///
/// Models the memory block of a transmit peripheral: the encoder fills it until
/// it is full, the hardware plays it out and the block is drained for reuse.
#[derive(Debug, Clone)]
pub struct SymbolBuffer {
    symbols: Vec<Symbol>,
    capacity: usize,
}

impl SymbolBuffer {
    /// Reserve a block holding `capacity` symbols
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut symbols = Vec::new();
        symbols
            .try_reserve_exact(capacity)
            .map_err(|_| EncoderError::no_memory(capacity))?;
        Ok(SymbolBuffer { symbols, capacity })
    }

    /// Maximum number of symbols the block holds
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of symbols currently stored
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the block is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Check if the block is full
    pub fn is_full(&self) -> bool {
        self.symbols.len() >= self.capacity
    }

    /// Number of free slots
    pub fn free(&self) -> usize {
        self.capacity - self.symbols.len()
    }

    /// Stored symbols in write order
    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Move the stored symbols out, keeping the reservation
    pub fn drain(&mut self) -> std::vec::Drain<'_, Symbol> {
        self.symbols.drain(..)
    }

    /// Discard the stored symbols
    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}

impl SymbolSink for SymbolBuffer {
    fn try_push(&mut self, symbol: Symbol) -> bool {
        if self.is_full() {
            return false;
        }
        self.symbols.push(symbol);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_backpressure() -> Result<()> {
        let mut buffer = SymbolBuffer::with_capacity(2)?;
        assert!(buffer.try_push(Symbol::bit(58, true)));
        assert_eq!(buffer.free(), 1);
        assert!(buffer.try_push(Symbol::bit(100, true)));
        assert!(buffer.is_full());
        assert!(!buffer.try_push(Symbol::bit(58, true)));
        assert_eq!(buffer.len(), 2);
        Ok(())
    }

    #[test]
    fn test_buffer_drain() -> Result<()> {
        let mut buffer = SymbolBuffer::with_capacity(4)?;
        buffer.try_push(Symbol::bit(58, true));
        buffer.try_push(Symbol::bit(100, true));
        let drained: Vec<Symbol> = buffer.drain().collect();
        assert_eq!(drained, vec![Symbol::bit(58, true), Symbol::bit(100, true)]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
        Ok(())
    }

    #[test]
    fn test_buffer_no_memory() {
        let err = SymbolBuffer::with_capacity(usize::MAX).unwrap_err();
        assert_eq!(err, EncoderError::no_memory(usize::MAX));
    }

    #[test]
    fn test_vec_sink_is_unbounded() {
        let mut sink: Vec<Symbol> = Vec::new();
        for _ in 0..1000 {
            assert!(sink.try_push(Symbol::bit(58, true)));
        }
        assert_eq!(sink.len(), 1000);
    }
}

//! Track symbols and the timing table derived from a configuration

use bitfield::bitfield;

use crate::config::EncoderConfig;
use crate::error::Result;

bitfield! {
    /// One bit cell on the track, packed the way symbol memory stores it
    ///
    /// Layout (32 bits):
    /// - Bits 14-0: duration of the first half
    /// - Bit 15: level of the first half
    /// - Bits 30-16: duration of the second half
    /// - Bit 31: level of the second half
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Symbol(u32);
    impl Debug;
    pub u16, duration0, set_duration0: 14, 0;
    pub level0, set_level0: 15;
    pub u16, duration1, set_duration1: 30, 16;
    pub level1, set_level1: 31;
}

impl Symbol {
    /// Largest duration a symbol half can hold
    pub const MAX_DURATION: u16 = 0x7FFF;

    /// Create a symbol from its two halves
    pub fn new(duration0: u16, level0: bool, duration1: u16, level1: bool) -> Self {
        let mut symbol = Symbol(0);
        symbol.set_duration0(duration0 & Self::MAX_DURATION);
        symbol.set_level0(level0);
        symbol.set_duration1(duration1 & Self::MAX_DURATION);
        symbol.set_level1(level1);
        symbol
    }

    /// A symbol with equal halves, the second at the inverted level
    pub fn bit(duration: u16, level0: bool) -> Self {
        Self::new(duration, level0, duration, !level0)
    }

    /// Get the raw 32-bit symbol word
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Total length of the bit cell
    pub fn period(&self) -> u32 {
        self.duration0() as u32 + self.duration1() as u32
    }

    /// Both half-bit durations, in transmission order
    pub fn timings(&self) -> [u32; 2] {
        [self.duration0() as u32, self.duration1() as u32]
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = |high: bool| if high { 'H' } else { 'L' };
        write!(
            f,
            "Symbol({}{}/{}{})",
            self.duration0(),
            level(self.level0()),
            self.duration1(),
            level(self.level1())
        )
    }
}

/// The four symbols every DCC packet is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTable {
    /// A "1" bit
    pub one: Symbol,
    /// A "0" bit
    pub zero: Symbol,
    /// The packet end bit
    pub end: Symbol,
    /// One BiDi cutout slot, `None` when the cutout is disabled
    pub bidi: Option<Symbol>,
}

impl SymbolTable {
    /// Derive the table from a configuration, validating it first
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        config.validate()?;

        let level0 = config.level0;
        let endbit_duration = match config.endbit_duration {
            0 => config.bit1_duration,
            duration => duration,
        };

        Ok(SymbolTable {
            one: Symbol::bit(config.bit1_duration, level0),
            zero: Symbol::bit(config.bit0_duration, level0),
            end: Symbol::new(config.bit1_duration, level0, endbit_duration, !level0),
            bidi: config
                .bidi_enabled()
                .then(|| Symbol::bit(config.bidibit_duration, level0)),
        })
    }
}

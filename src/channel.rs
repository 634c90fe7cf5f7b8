//! Simulated transmit channel driving a DCC encoder

use log::debug;

use crate::config::EncoderConfig;
use crate::encoder::{DccEncoder, EncodeState, Encoded};
use crate::error::{ConfigError, Result};
use crate::sink::SymbolBuffer;
use crate::symbol::Symbol;

/// Transmit channel options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Size of the channel's symbol memory block
    pub mem_block_symbols: usize,
    /// Additional times every packet is repeated
    pub loop_count: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            mem_block_symbols: 64,
            loop_count: 0,
        }
    }
}

/// Counters of a [`TxChannel::transmit`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxStats {
    /// Symbols encoded
    pub symbols: usize,
    /// Times the memory block was played out because it ran full
    pub refills: usize,
    /// Packets completed
    pub packets: usize,
}

/// A transmit channel with a fixed symbol memory block
///
/// The encoder fills the block; whenever it runs full the block is played
/// out to the track and the encoder is called again, as the peripheral's
/// refill interrupt would do.
#[derive(Debug)]
pub struct TxChannel {
    encoder: DccEncoder,
    memory: SymbolBuffer,
    config: ChannelConfig,
    line: Vec<Symbol>,
}

impl TxChannel {
    /// Create a channel and its encoder
    pub fn new(encoder_config: &EncoderConfig, config: ChannelConfig) -> Result<Self> {
        if config.mem_block_symbols == 0 {
            return Err(ConfigError::EmptyMemBlock.into());
        }
        let encoder = DccEncoder::new(encoder_config)?;
        let memory = SymbolBuffer::with_capacity(config.mem_block_symbols)?;
        debug!(
            "created TX channel: mem_block_symbols={} loop_count={}",
            config.mem_block_symbols, config.loop_count
        );

        Ok(TxChannel {
            encoder,
            memory,
            config,
            line: Vec::new(),
        })
    }

    /// Get the channel's encoder
    pub fn encoder(&self) -> &DccEncoder {
        &self.encoder
    }

    /// Symbols played out to the track so far
    pub fn line(&self) -> &[Symbol] {
        &self.line
    }

    /// Take the played out symbols, leaving the line empty
    pub fn take_line(&mut self) -> Vec<Symbol> {
        std::mem::take(&mut self.line)
    }

    /// Half-bit durations of everything played out so far
    pub fn timings(&self) -> Vec<u32> {
        self.line.iter().flat_map(Symbol::timings).collect()
    }

    /// Encode into the free part of the memory block
    pub fn fill(&mut self, packet: &[u8]) -> Encoded {
        self.encoder.encode(&mut self.memory, packet)
    }

    /// Play the memory block out to the track
    pub fn play_out(&mut self) -> usize {
        let played = self.memory.len();
        self.line.extend(self.memory.drain());
        played
    }

    /// Send a packet `1 + loop_count` times
    pub fn transmit(&mut self, packet: &[u8]) -> TxStats {
        let mut stats = TxStats::default();
        for _ in 0..=self.config.loop_count {
            loop {
                let encoded = self.fill(packet);
                stats.symbols += encoded.symbols;
                if encoded.state == EncodeState::Complete {
                    stats.packets += 1;
                    break;
                }
                self.play_out();
                stats.refills += 1;
            }
        }
        self.play_out();

        debug!(
            "transmitted {} byte packet: {} symbols, {} refills",
            packet.len(),
            stats.symbols,
            stats.refills
        );
        stats
    }

    /// Stop the channel, dropping unsent symbols and the packet in progress
    pub fn disable(&mut self) {
        debug!("disabling TX channel with {} symbols pending", self.memory.len());
        self.memory.clear();
        self.encoder.reset();
    }
}

/// Half-bit durations of a single packet encoded with `config`
///
/// The packet goes out as the first one after construction, so no cutout
/// precedes it.
pub fn packet_to_timings(config: &EncoderConfig, packet: &[u8]) -> Result<Vec<u32>> {
    let mut encoder = DccEncoder::new(config)?;
    let mut symbols = Vec::with_capacity(encoder.symbols_per_packet(packet.len()));
    encoder.encode(&mut symbols, packet);
    Ok(symbols.iter().flat_map(Symbol::timings).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Phase;
    use crate::error::EncoderError;

    #[test]
    fn test_empty_mem_block_rejected() {
        let config = ChannelConfig {
            mem_block_symbols: 0,
            ..ChannelConfig::default()
        };
        let err = TxChannel::new(&EncoderConfig::default(), config).unwrap_err();
        assert_eq!(err, EncoderError::InvalidArgument(ConfigError::EmptyMemBlock));
    }

    #[test]
    fn test_transmit_with_refills() -> Result<()> {
        let config = ChannelConfig {
            mem_block_symbols: 8,
            loop_count: 0,
        };
        let mut channel = TxChannel::new(&EncoderConfig::default(), config)?;
        let stats = channel.transmit(&[0x03, 0x3F, 0x3C]);

        let expected = channel.encoder().symbols_per_packet(3) - 4;
        assert_eq!(stats.symbols, expected);
        assert_eq!(stats.packets, 1);
        assert_eq!(stats.refills, expected / 8);
        assert_eq!(channel.line().len(), expected);
        Ok(())
    }

    #[test]
    fn test_loop_count_repeats_packet() -> Result<()> {
        let encoder_config = EncoderConfig::default();
        let config = ChannelConfig {
            mem_block_symbols: 48,
            loop_count: 2,
        };
        let mut channel = TxChannel::new(&encoder_config, config)?;
        let stats = channel.transmit(&[0xFF, 0x00, 0xFF]);

        let per_packet = channel.encoder().symbols_per_packet(3);
        assert_eq!(stats.packets, 3);
        assert_eq!(stats.symbols, 3 * per_packet - 4);
        assert_eq!(channel.take_line().len(), stats.symbols);
        assert!(channel.line().is_empty());
        Ok(())
    }

    #[test]
    fn test_disable_abandons_packet() -> Result<()> {
        let encoder_config = EncoderConfig::builder().bidibit_duration(0).build()?;
        let mut channel = TxChannel::new(&encoder_config, ChannelConfig::default())?;
        let encoded = channel.fill(&[0x01; 10]);
        assert_eq!(encoded.state, EncodeState::MemFull);

        channel.disable();
        assert_eq!(channel.encoder().phase(), Phase::SyncZero);
        assert_eq!(channel.play_out(), 0);

        channel.transmit(&[0x01]);
        assert_eq!(channel.timings(), packet_to_timings(&encoder_config, &[0x01])?);
        Ok(())
    }

    #[test]
    fn test_packet_to_timings() -> Result<()> {
        let config = EncoderConfig::builder().preamble_bits(14).build()?;
        let timings = packet_to_timings(&config, &[0x80])?;
        assert_eq!(timings.len(), 2 * (14 + 9 + 1));
        assert!(timings[..28].iter().all(|&t| t == 58));
        assert_eq!(&timings[28..32], &[100, 100, 58, 58]);
        Ok(())
    }
}

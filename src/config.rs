//! Encoder timing configuration and validation

use crate::error::{ConfigError, Result};
use crate::limits::{
    MAX_BIDI_BIT_TIMING, MAX_BIT_0_TIMING, MAX_BIT_1_TIMING, MAX_PREAMBLE_BITS,
    MIN_BIDI_BIT_TIMING, MIN_BIT_0_TIMING, MIN_BIT_1_TIMING, MIN_PREAMBLE_BITS,
};
use log::warn;

/// Timing and framing options of a DCC encoder
///
/// Durations are half-bit lengths in microseconds (one tick of a 1 MHz
/// transmit peripheral). A configuration is only accepted once it passes
/// [`EncoderConfig::validate`]; encoders never re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncoderConfig {
    /// Number of "1" bits in the preamble
    pub preamble_bits: usize,
    /// Half-bit duration of a "1"
    pub bit1_duration: u16,
    /// Half-bit duration of a "0"
    pub bit0_duration: u16,
    /// Duration of the second half of the end bit, 0 to reuse `bit1_duration`
    pub endbit_duration: u16,
    /// Half-bit duration pacing the BiDi cutout, 0 disables the cutout
    pub bidibit_duration: u16,
    /// Physical level of the first half of every symbol
    pub level0: bool,
    /// Send an extra "0" bit in front of the preamble
    pub sync_zero: bool,
}

impl EncoderConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::new()
    }

    /// Whether the BiDi cutout is sent after every packet
    pub fn bidi_enabled(&self) -> bool {
        self.bidibit_duration != 0
    }

    /// Check every field against the protocol limits
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let result = self.check_ranges();
        if let Err(err) = &result {
            warn!("rejecting encoder configuration: {}", err);
        }
        result
    }

    fn check_ranges(&self) -> std::result::Result<(), ConfigError> {
        if !(MIN_PREAMBLE_BITS..=MAX_PREAMBLE_BITS).contains(&self.preamble_bits) {
            return Err(ConfigError::PreambleBits {
                bits: self.preamble_bits,
                min: MIN_PREAMBLE_BITS,
                max: MAX_PREAMBLE_BITS,
            });
        }

        if self.bidi_enabled()
            && !(MIN_BIDI_BIT_TIMING..=MAX_BIDI_BIT_TIMING).contains(&self.bidibit_duration)
        {
            return Err(ConfigError::BidiBitDuration {
                duration: self.bidibit_duration,
                min: MIN_BIDI_BIT_TIMING,
                max: MAX_BIDI_BIT_TIMING,
            });
        }

        if !(MIN_BIT_1_TIMING..=MAX_BIT_1_TIMING).contains(&self.bit1_duration) {
            return Err(ConfigError::Bit1Duration {
                duration: self.bit1_duration,
                min: MIN_BIT_1_TIMING,
                max: MAX_BIT_1_TIMING,
            });
        }

        if !(MIN_BIT_0_TIMING..=MAX_BIT_0_TIMING).contains(&self.bit0_duration) {
            return Err(ConfigError::Bit0Duration {
                duration: self.bit0_duration,
                min: MIN_BIT_0_TIMING,
                max: MAX_BIT_0_TIMING,
            });
        }

        if self.endbit_duration > MAX_BIT_1_TIMING {
            return Err(ConfigError::EndBitDuration {
                duration: self.endbit_duration,
                max: MAX_BIT_1_TIMING,
            });
        }

        Ok(())
    }

    /// Parse a JSON configuration and validate it
    ///
    /// Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EncoderConfig = serde_json::from_str(json)
            .map_err(|e| crate::error::EncoderError::malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            preamble_bits: 17,
            bit1_duration: 58,
            bit0_duration: 100,
            endbit_duration: 0,
            bidibit_duration: 58,
            level0: true,
            sync_zero: false,
        }
    }
}

/// Builder for [`EncoderConfig`]
#[derive(Debug, Clone, Default)]
pub struct EncoderConfigBuilder {
    config: EncoderConfig,
}

impl EncoderConfigBuilder {
    /// Create a new builder holding the default configuration
    pub fn new() -> Self {
        EncoderConfigBuilder {
            config: EncoderConfig::default(),
        }
    }

    /// Set the preamble length
    pub fn preamble_bits(mut self, bits: usize) -> Self {
        self.config.preamble_bits = bits;
        self
    }

    /// Set the "1" half-bit duration
    pub fn bit1_duration(mut self, duration: u16) -> Self {
        self.config.bit1_duration = duration;
        self
    }

    /// Set the "0" half-bit duration
    pub fn bit0_duration(mut self, duration: u16) -> Self {
        self.config.bit0_duration = duration;
        self
    }

    /// Set the second half of the end bit (0 reuses the "1" duration)
    pub fn endbit_duration(mut self, duration: u16) -> Self {
        self.config.endbit_duration = duration;
        self
    }

    /// Set the BiDi cutout bit duration (0 disables the cutout)
    pub fn bidibit_duration(mut self, duration: u16) -> Self {
        self.config.bidibit_duration = duration;
        self
    }

    /// Set the physical level of the first symbol half
    pub fn level0(mut self, level: bool) -> Self {
        self.config.level0 = level;
        self
    }

    /// Enable or disable the sync zero bit in front of the preamble
    pub fn sync_zero(mut self, enabled: bool) -> Self {
        self.config.sync_zero = enabled;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<EncoderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

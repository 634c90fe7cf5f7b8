//! Receive-side packet reassembly from half-bit timings
//!
//! The receiver measures the time between polarity reversals, classifies each
//! half-bit as a "1" or "0" half, pairs halves into bits and frames bits into
//! packets: at least ten preamble ones, then `0 byte` groups, then a `1` end
//! bit. What the packet bytes mean is up to the [`Decoder`](crate::decoder::Decoder).

use log::trace;

use crate::limits::{
    MAX_PACKET_SIZE, RX_MAX_BIT_0_TIMING, RX_MAX_BIT_1_TIMING, RX_MIN_BIT_0_TIMING,
    RX_MIN_BIT_1_TIMING, RX_MIN_PREAMBLE_BITS,
};

/// A reassembled DCC packet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet(Vec<u8>);

impl Packet {
    /// Wrap raw packet bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Packet(bytes)
    }

    /// Build a packet from instruction bytes, appending the XOR error detection byte
    pub fn with_checksum(bytes: &[u8]) -> Self {
        let checksum = bytes.iter().fold(0u8, |acc, b| acc ^ b);
        let mut data = Vec::with_capacity(bytes.len() + 1);
        data.extend_from_slice(bytes);
        data.push(checksum);
        Packet(data)
    }

    /// Get the packet bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes, including the error detection byte
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the packet has no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the XOR error detection byte
    ///
    /// The XOR over all bytes, the error detection byte included, must be zero.
    pub fn is_valid(&self) -> bool {
        self.0.len() >= 2 && self.0.iter().fold(0u8, |acc, b| acc ^ b) == 0
    }

    /// Consume the packet, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Packet[")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HalfBit {
    One,
    Zero,
}

impl HalfBit {
    fn classify(time: u32) -> Option<Self> {
        if (RX_MIN_BIT_1_TIMING..=RX_MAX_BIT_1_TIMING).contains(&time) {
            Some(HalfBit::One)
        } else if (RX_MIN_BIT_0_TIMING..=RX_MAX_BIT_0_TIMING).contains(&time) {
            Some(HalfBit::Zero)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble { ones: usize },
    Data { bits: u8, byte: u8 },
    Separator,
    EndBit,
}

/// Reassembles packets from a stream of half-bit timings
#[derive(Debug, Clone)]
pub struct Receiver {
    state: State,
    first_half: Option<HalfBit>,
    bytes: Vec<u8>,
}

impl Receiver {
    /// Create a new receiver waiting for a preamble
    pub fn new() -> Self {
        Receiver {
            state: State::Preamble { ones: 0 },
            first_half: None,
            bytes: Vec::with_capacity(MAX_PACKET_SIZE),
        }
    }

    /// Feed one half-bit duration in microseconds
    ///
    /// Returns a packet once its end bit has started.
    pub fn receive(&mut self, time: u32) -> Option<Packet> {
        // Second half of the end bit, its length is up to the transmitter
        if self.state == State::EndBit {
            self.restart();
            return None;
        }

        let Some(half) = HalfBit::classify(time) else {
            trace!("dropping packet on invalid timing {}us", time);
            self.restart();
            return None;
        };

        match self.first_half.take() {
            None if self.state == State::Separator && half == HalfBit::One => {
                self.state = State::EndBit;
                let packet = Packet(std::mem::take(&mut self.bytes));
                trace!("received {}", packet);
                Some(packet)
            }
            None => {
                self.first_half = Some(half);
                None
            }
            Some(first) if first == half => {
                self.bit(half == HalfBit::One);
                None
            }
            Some(_) => {
                // Out of step by one half, realign on this one
                if !matches!(self.state, State::Preamble { .. }) {
                    self.restart();
                }
                self.first_half = Some(half);
                None
            }
        }
    }

    /// Feed a run of timings, collecting every completed packet
    pub fn receive_all(&mut self, timings: &[u32]) -> Vec<Packet> {
        timings.iter().filter_map(|&time| self.receive(time)).collect()
    }

    fn bit(&mut self, one: bool) {
        self.state = match self.state {
            State::Preamble { ones } if one => State::Preamble { ones: ones + 1 },
            State::Preamble { ones } if ones >= RX_MIN_PREAMBLE_BITS => {
                self.bytes.clear();
                State::Data { bits: 0, byte: 0 }
            }
            State::Preamble { .. } => State::Preamble { ones: 0 },
            State::Data { bits, byte } => {
                let byte = (byte << 1) | u8::from(one);
                if bits + 1 < 8 {
                    State::Data {
                        bits: bits + 1,
                        byte,
                    }
                } else if self.bytes.len() < MAX_PACKET_SIZE {
                    self.bytes.push(byte);
                    State::Separator
                } else {
                    trace!("dropping packet longer than {} bytes", MAX_PACKET_SIZE);
                    self.bytes.clear();
                    State::Preamble { ones: 0 }
                }
            }
            State::Separator => State::Data { bits: 0, byte: 0 },
            State::EndBit => State::Preamble { ones: 0 },
        };
    }

    fn restart(&mut self) {
        self.state = State::Preamble { ones: 0 };
        self.first_half = None;
        self.bytes.clear();
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

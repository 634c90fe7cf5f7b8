//! Capabilities a DCC decoder exposes to the receive side
//!
//! The encoder's symbols end up at a decoder on the track. Reassembly into
//! packets is done by [`Receiver`](crate::receiver::Receiver); what a packet
//! does is up to an implementation of these traits.

/// Locomotive or accessory address
pub type Address = u16;

/// Synchronous configuration variable read access
pub trait Readable {
    /// Read the CV at `cv_addr` (0-based)
    fn read_cv(&mut self, cv_addr: u32) -> u8;
}

/// Configuration variable write access
pub trait Writable {
    /// Write `byte` to the CV at `cv_addr` (0-based), returning the stored value
    fn write_cv(&mut self, cv_addr: u32, byte: u8) -> u8;
}

/// Configuration variable read access completing later, e.g. from flash
pub trait AsyncReadable {
    /// Start reading the CV at `cv_addr`, calling `cb` with the value
    fn read_cv_async(&mut self, cv_addr: u32, byte: u8, cb: Box<dyn FnOnce(u8) + Send>);
}

/// Everything a decoder must handle
pub trait Decoder: Readable + Writable {
    /// Set direction, `true` is forward
    fn direction(&mut self, addr: Address, forward: bool);

    /// Set speed, 0 is stop and negative values are emergency stop
    fn speed(&mut self, addr: Address, speed: i32);

    /// Set the functions selected by `mask` to the bits of `state`
    fn function(&mut self, addr: Address, mask: u32, state: u32);

    /// Service mode was entered (`true`) or left (`false`)
    fn service_mode_hook(&mut self, service_mode: bool);

    /// Generate a service mode acknowledge pulse
    fn service_ack(&mut self);

    /// Send a BiDi datagram in the next cutout
    fn transmit_bidi(&mut self, bytes: &[u8]);
}

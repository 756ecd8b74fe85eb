#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # RTS Core
//!
//! Somfy RTS frame transport for embedded systems.
//! Turns an opaque 7-byte frame into a bit-banged OOK burst with
//! microsecond-exact timing: hardware wake-up, sync preamble, frame-start
//! marker, 56 Manchester-style data bits and inter-frame silence, sent
//! once with a short preamble and twice more with a long one.

pub mod types;
pub mod hal;
pub mod encoder;
pub mod transmitter;
pub mod command;
pub mod pulse;
pub mod controller;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use types::*;
pub use encoder::{transmission_steps, LineOp, Step, TransmissionSteps, TxPhase};
pub use transmitter::*;
pub use command::{parse_command, Command, CommandError, LineBuffer};
pub use controller::{CommandController, Outcome};
pub use pulse::{emit_pulse, run_pulse, PinBank, PulseRequest};
pub use hal::{BitTimer, EmbeddedHalTxLine, HalError, TxLine};

/// RTS core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration for an Arduino-style RTS bridge
pub fn default_config() -> RtsConfig {
    RtsConfig {
        symbol_us: DEFAULT_SYMBOL_US,
        tx_pin: DEFAULT_TX_PIN,
        pulse_pin_min: 2,
        pulse_pin_max: 19,
    }
}

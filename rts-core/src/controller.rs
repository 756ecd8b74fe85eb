//! Command controller: executes received lines against the radio and pulse pins

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::command::{parse_command, Command, CommandError};
use crate::hal::{HalError, TxLine};
use crate::pulse::{run_pulse, PinBank, PulseRequest};
use crate::transmitter::SharedTransmitter;
use crate::types::{Frame, RtsConfig};

/// Result of handling one command line
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Burst for this frame completed
    Sent(Frame),
    /// Pulse completed
    Pulsed(PulseRequest),
    /// Line rejected, nothing was driven
    Rejected(CommandError),
    /// Hardware failed while executing
    Failed(HalError),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Sent(_) | Outcome::Pulsed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Sent(frame) => write!(f, "{}", frame),
            Outcome::Pulsed(request) => {
                write!(f, "PULSE({},{})", request.pin, request.duration_ms)
            }
            Outcome::Rejected(error) => write!(f, "Error {}\r\n{}", error, CommandError::usage()),
            Outcome::Failed(error) => write!(f, "Error E10: hardware fault ({:?})", error),
        }
    }
}

/// Executes commands, one at a time, for a fixed configuration
pub struct CommandController<'a, L, D> {
    config: RtsConfig,
    transmitter: &'a SharedTransmitter<L, D>,
}

impl<'a, L, D> CommandController<'a, L, D>
where
    L: TxLine<Error = HalError>,
    D: DelayNs,
{
    pub fn new(config: RtsConfig, transmitter: &'a SharedTransmitter<L, D>) -> Self {
        Self { config, transmitter }
    }

    pub fn config(&self) -> &RtsConfig {
        &self.config
    }

    /// Parse and execute one line.
    ///
    /// A line that fails to parse never reaches the transmitter.
    pub fn handle_line<B, P>(&self, line: &str, pins: &mut B, delay: &mut P) -> Outcome
    where
        B: PinBank,
        P: DelayNs,
    {
        match parse_command(line, &self.config) {
            Ok(command) => self.execute(command, pins, delay),
            Err(error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("❌ Rejected line: {}", error);
                Outcome::Rejected(error)
            }
        }
    }

    /// Execute an already parsed command
    pub fn execute<B, P>(&self, command: Command, pins: &mut B, delay: &mut P) -> Outcome
    where
        B: PinBank,
        P: DelayNs,
    {
        match command {
            Command::SendFrame(frame) => match self.transmitter.send(&frame) {
                Ok(()) => Outcome::Sent(frame),
                Err(error) => Outcome::Failed(error),
            },
            Command::Pulse(request) => match run_pulse(pins, delay, &request) {
                Ok(()) => Outcome::Pulsed(request),
                Err(error) => Outcome::Failed(error),
            },
        }
    }
}

//! Serial command line parsing
//!
//! Two commands are understood, case-insensitive with spaces ignored:
//!
//! - `A71A2B3C4D5E6F` - 14 hex digits, one RTS frame to send
//! - `PULSE(13,250)` - drive pin 13 high for 250 ms

use heapless::String;

use crate::pulse::PulseRequest;
use crate::types::{Frame, RtsConfig, FRAME_LEN};

/// Longest accepted command line, spaces excluded
pub const LINE_CAPACITY: usize = 64;

/// Hex digits in a textual frame
pub const HEX_FRAME_LEN: usize = FRAME_LEN * 2;

/// Parsed command
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Send one frame as a full burst
    SendFrame(Frame),
    /// Diagnostic pulse
    Pulse(PulseRequest),
}

/// Command rejected before anything reached a pin
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// E01: not a pulse and not 14 characters long
    WrongLength(usize),
    /// E02: frame contains a non-hex character
    InvalidHex { position: usize, character: char },
    /// E03: pulse arguments missing or not decimal
    MalformedPulse,
    /// E04: pulse aimed at the radio pin
    ReservedPin(u8),
    /// E05: pulse pin outside the allowed range
    PinOutOfRange(u32),
    /// E06: receiver overran while the line was arriving, bytes were lost
    Overrun,
}

impl CommandError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::WrongLength(_) => "E01",
            Self::InvalidHex { .. } => "E02",
            Self::MalformedPulse => "E03",
            Self::ReservedPin(_) => "E04",
            Self::PinOutOfRange(_) => "E05",
            Self::Overrun => "E06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::WrongLength(_) => "the frame should have a length of 14 characters (7 bytes)",
            Self::InvalidHex { .. } => "the frame does not only contain HEX characters",
            Self::MalformedPulse => "expected PULSE(pin,duration_ms)",
            Self::ReservedPin(_) => "pin is reserved for the transmitter",
            Self::PinOutOfRange(_) => "pin out of range",
            Self::Overrun => "input overrun, line dropped",
        }
    }

    /// Usage reminder sent after a rejected line
    pub const fn usage() -> &'static str {
        "Valid commands: <14 hex chars> (raw RTS frame) | PULSE(pin,duration_ms)"
    }
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        match self {
            Self::WrongLength(len) => write!(f, " (got {})", len),
            Self::InvalidHex { position, character } => {
                write!(f, " ('{}' at {})", character, position)
            }
            Self::ReservedPin(pin) => write!(f, " ({})", pin),
            Self::PinOutOfRange(pin) => write!(f, " ({})", pin),
            Self::MalformedPulse | Self::Overrun => Ok(()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

fn is_ignored(c: char) -> bool {
    c == ' ' || c == '\r' || c == '\n'
}

/// Parse one received line into a command
pub fn parse_command(line: &str, config: &RtsConfig) -> Result<Command, CommandError> {
    let len = line.chars().filter(|c| !is_ignored(*c)).count();
    if len > LINE_CAPACITY {
        return Err(CommandError::WrongLength(len));
    }

    let mut normalized: String<LINE_CAPACITY> = String::new();
    for c in line.chars().filter(|c| !is_ignored(*c)) {
        normalized
            .push(c.to_ascii_uppercase())
            .map_err(|_| CommandError::WrongLength(len))?;
    }

    if let Some(args) = normalized
        .strip_prefix("PULSE(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_pulse(args, config).map(Command::Pulse);
    }

    if len == HEX_FRAME_LEN {
        return parse_hex_frame(&normalized).map(Command::SendFrame);
    }

    Err(CommandError::WrongLength(len))
}

fn parse_pulse(args: &str, config: &RtsConfig) -> Result<PulseRequest, CommandError> {
    let (pin, duration) = args.split_once(',').ok_or(CommandError::MalformedPulse)?;
    let pin: u32 = pin.parse().map_err(|_| CommandError::MalformedPulse)?;
    let duration_ms: u32 = duration.parse().map_err(|_| CommandError::MalformedPulse)?;

    PulseRequest::new(pin, duration_ms, config)
}

/// Decode exactly 14 hex digits into a frame.
///
/// The whole frame is rejected at the first non-hex character.
pub fn parse_hex_frame(text: &str) -> Result<Frame, CommandError> {
    let len = text.chars().count();
    if len != HEX_FRAME_LEN {
        return Err(CommandError::WrongLength(len));
    }

    let mut bytes = [0u8; FRAME_LEN];
    for (position, character) in text.chars().enumerate() {
        let nibble = character
            .to_digit(16)
            .ok_or(CommandError::InvalidHex { position, character })? as u8;
        bytes[position / 2] |= if position % 2 == 0 { nibble << 4 } else { nibble };
    }

    Ok(Frame::new(bytes))
}

/// Raw bytes buffered for one received line, spaces included
pub const RAW_LINE_CAPACITY: usize = 96;

/// One received line
pub type Line = String<RAW_LINE_CAPACITY>;

/// Assembles received bytes into newline-terminated lines
pub struct LineBuffer {
    buf: heapless::Vec<u8, RAW_LINE_CAPACITY>,
    dropped: usize,
    overrun: bool,
}

impl LineBuffer {
    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            dropped: 0,
            overrun: false,
        }
    }

    /// Record that the receiver lost bytes; the line being assembled is
    /// reported as `Overrun` once its newline arrives
    pub fn mark_overrun(&mut self) {
        self.overrun = true;
    }

    /// Feed one byte; a completed line is returned on `\n`.
    ///
    /// Lines that overflowed the buffer or are not UTF-8 come back as
    /// `WrongLength` so the sender still gets a diagnostic.
    pub fn push(&mut self, byte: u8) -> Option<Result<Line, CommandError>> {
        if byte != b'\n' {
            if self.buf.push(byte).is_err() {
                self.dropped += 1;
            }
            return None;
        }

        let result = if self.overrun {
            Err(CommandError::Overrun)
        } else if self.dropped > 0 {
            Err(CommandError::WrongLength(self.buf.len() + self.dropped))
        } else {
            core::str::from_utf8(&self.buf)
                .ok()
                .and_then(|text| Line::try_from(text).ok())
                .ok_or(CommandError::WrongLength(self.buf.len()))
        };
        self.clear();
        Some(result)
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.buf.clear();
        self.dropped = 0;
        self.overrun = false;
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

//! Core data types for the RTS frame transport

use core::fmt;

/// Bytes in one Somfy RTS frame
pub const FRAME_LEN: usize = 7;

/// Data bits carried by one frame
pub const FRAME_BITS: usize = FRAME_LEN * 8;

/// Default symbol length (half-bit period) in microseconds
pub const DEFAULT_SYMBOL_US: u16 = 640;

/// Default transmit pin (Arduino Uno D5 / PORTD bit 5)
pub const DEFAULT_TX_PIN: u8 = 5;

/// Repeat transmissions following the first one in a burst
pub const BURST_REPEATS: usize = 2;

/// Protocol timing constants.
///
/// All values are microseconds and are fixed by the receiver's decoder:
/// they never scale with the configured symbol length. Every hold fits a
/// 16-bit microsecond delay, matching the bounded timer APIs of small MCUs.
pub mod timing {
    /// Hardware wake-up pulse, high time
    pub const WAKEUP_HIGH_US: u16 = 9415;
    /// Hardware wake-up pulse, low time
    pub const WAKEUP_LOW_US: u16 = 24030;
    /// Additional low hold after the wake-up pulse
    pub const WAKEUP_EXTRA_LOW_US: u16 = 65535;
    /// Frame-start marker, high time (low time is one symbol)
    pub const FRAME_START_HIGH_US: u16 = 4550;
    /// Trailing silence closing every transmission
    pub const INTER_FRAME_SILENCE_US: u16 = 30415;
    /// Width of one software sync half-pulse, in symbols
    pub const SYNC_PULSE_SYMBOLS: u16 = 4;
    /// Largest symbol for which a sync half-pulse still fits 16 bits
    pub const MAX_SYMBOL_US: u16 = u16::MAX / SYNC_PULSE_SYMBOLS;
}

/// Logic level of the transmit line
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Carrier off
    #[default]
    Low,
    /// Carrier on
    High,
}

impl Level {
    /// Returns the opposite level
    pub const fn inverted(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Opaque 7-byte RTS frame.
///
/// No structure (checksum, rolling code, address) is checked here: any
/// seven bytes are transmissible.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a frame from a slice of exactly seven bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; FRAME_LEN]>::try_from(bytes).ok().map(Self)
    }

    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Bit `index` of the frame, most significant bit of byte 0 first.
    ///
    /// # Panics
    /// Panics if `index >= FRAME_BITS`.
    pub const fn bit(&self, index: usize) -> bool {
        (self.0[index / 8] >> (7 - (index % 8))) & 1 == 1
    }

    /// All 56 bits in transmission order
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..FRAME_BITS).map(move |i| self.bit(i))
    }
}

impl From<[u8; FRAME_LEN]> for Frame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Position of a transmission inside a burst.
///
/// The kind fixes the sync count, which is the only thing that differs
/// between the first send and its repeats.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmissionKind {
    /// First send: hardware wake-up followed by a short 2-pulse preamble
    First,
    /// Repeat send: 7-pulse preamble, receiver assumed awake
    Repeat,
}

impl TransmissionKind {
    /// Number of software sync pulses in the preamble
    pub const fn sync_count(&self) -> u8 {
        match self {
            TransmissionKind::First => 2,
            TransmissionKind::Repeat => 7,
        }
    }

    /// Returns true if the transmission starts with the hardware wake-up pulse
    pub const fn has_hardware_wakeup(&self) -> bool {
        matches!(self, TransmissionKind::First)
    }

    /// Map a raw sync count back to a kind
    pub const fn from_sync_count(sync_count: u8) -> Option<Self> {
        match sync_count {
            2 => Some(TransmissionKind::First),
            7 => Some(TransmissionKind::Repeat),
            _ => None,
        }
    }
}

/// Transport configuration, fixed for the lifetime of a transmitter
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtsConfig {
    /// Symbol (half-bit) length in microseconds
    pub symbol_us: u16,
    /// Pin reserved for the radio, never usable for diagnostic pulses
    pub tx_pin: u8,
    /// Lowest pin accepted for a diagnostic pulse
    pub pulse_pin_min: u8,
    /// Highest pin accepted for a diagnostic pulse
    pub pulse_pin_max: u8,
}

impl Default for RtsConfig {
    fn default() -> Self {
        Self {
            symbol_us: DEFAULT_SYMBOL_US,
            tx_pin: DEFAULT_TX_PIN,
            pulse_pin_min: 2,
            pulse_pin_max: 19,
        }
    }
}

impl RtsConfig {
    /// Create a new configuration with validation
    pub fn new(
        symbol_us: u16,
        tx_pin: u8,
        pulse_pin_min: u8,
        pulse_pin_max: u8,
    ) -> Result<Self, &'static str> {
        let config = Self {
            symbol_us,
            tx_pin,
            pulse_pin_min,
            pulse_pin_max,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check a configuration, including one built from a struct literal
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.symbol_us == 0 {
            return Err("Symbol length must be non-zero");
        }
        if self.symbol_us > timing::MAX_SYMBOL_US {
            return Err("Symbol length must be <= 16383us");
        }
        if self.pulse_pin_min > self.pulse_pin_max {
            return Err("Pulse pin range is empty");
        }
        Ok(())
    }

    /// Width of one software sync half-pulse; requires a validated symbol
    pub const fn sync_pulse_us(&self) -> u16 {
        self.symbol_us * timing::SYNC_PULSE_SYMBOLS
    }

    /// Half-bit period of the data phase
    pub const fn half_bit_us(&self) -> u16 {
        self.symbol_us
    }
}

//! Line-step encoding of a single RTS transmission
//!
//! A transmission is rendered as a fixed sequence of steps, each one an
//! optional line write followed by a busy-wait hold:
//!
//! ```text
//! Idle -> HardwareWakeup (first only) -> SoftwareSync -> FrameStart
//!      -> Data[0..112] -> Silence -> Done
//! ```
//!
//! The sequence is a pure function of (frame, kind, symbol length) and is
//! produced lazily without allocation.

use crate::types::{timing, Frame, Level, TransmissionKind, BURST_REPEATS, FRAME_BITS};

/// Half-bit periods in the data phase
pub const DATA_HALF_BITS: usize = FRAME_BITS * 2;

/// Line write performed at the start of a step
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineOp {
    /// Drive the line to an absolute level
    Set(Level),
    /// Invert whatever level the line is at
    Toggle,
    /// Leave the line untouched
    Keep,
}

/// One line write plus the hold that follows it
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    pub op: LineOp,
    pub hold_us: u16,
}

impl Step {
    pub const fn set(level: Level, hold_us: u16) -> Self {
        Self {
            op: LineOp::Set(level),
            hold_us,
        }
    }

    pub const fn toggle(hold_us: u16) -> Self {
        Self {
            op: LineOp::Toggle,
            hold_us,
        }
    }

    pub const fn keep(hold_us: u16) -> Self {
        Self {
            op: LineOp::Keep,
            hold_us,
        }
    }
}

/// Transmission phases, carrying the index of the next step inside the phase
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPhase {
    Idle,
    HardwareWakeup(u8),
    SoftwareSync(u8),
    FrameStart(u8),
    Data(u8),
    Silence,
    Done,
}

/// Iterator over the steps of one transmission
#[derive(Clone, Debug)]
pub struct TransmissionSteps {
    frame: Frame,
    kind: TransmissionKind,
    symbol_us: u16,
    phase: TxPhase,
}

impl TransmissionSteps {
    /// `symbol_us` must lie in `1..=MAX_SYMBOL_US` so every hold fits 16 bits
    pub fn new(frame: Frame, kind: TransmissionKind, symbol_us: u16) -> Self {
        Self {
            frame,
            kind,
            symbol_us,
            phase: TxPhase::Idle,
        }
    }

    /// Phase the next step will come from
    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    pub fn kind(&self) -> TransmissionKind {
        self.kind
    }

    fn sync_pulse_us(&self) -> u16 {
        self.symbol_us * timing::SYNC_PULSE_SYMBOLS
    }
}

impl Iterator for TransmissionSteps {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        loop {
            match self.phase {
                TxPhase::Idle => {
                    self.phase = if self.kind.has_hardware_wakeup() {
                        TxPhase::HardwareWakeup(0)
                    } else {
                        TxPhase::SoftwareSync(0)
                    };
                }

                TxPhase::HardwareWakeup(i) => {
                    let step = match i {
                        0 => Step::set(Level::High, timing::WAKEUP_HIGH_US),
                        1 => Step::set(Level::Low, timing::WAKEUP_LOW_US),
                        _ => Step::keep(timing::WAKEUP_EXTRA_LOW_US),
                    };
                    self.phase = if i < 2 {
                        TxPhase::HardwareWakeup(i + 1)
                    } else {
                        TxPhase::SoftwareSync(0)
                    };
                    return Some(step);
                }

                TxPhase::SoftwareSync(i) => {
                    if i >= self.kind.sync_count() * 2 {
                        self.phase = TxPhase::FrameStart(0);
                        continue;
                    }
                    let level = if i % 2 == 0 { Level::High } else { Level::Low };
                    self.phase = TxPhase::SoftwareSync(i + 1);
                    return Some(Step::set(level, self.sync_pulse_us()));
                }

                TxPhase::FrameStart(0) => {
                    self.phase = TxPhase::FrameStart(1);
                    return Some(Step::set(Level::High, timing::FRAME_START_HIGH_US));
                }

                TxPhase::FrameStart(_) => {
                    self.phase = TxPhase::Data(0);
                    return Some(Step::set(Level::Low, self.symbol_us));
                }

                TxPhase::Data(i) => {
                    let half = usize::from(i);
                    if half >= DATA_HALF_BITS {
                        self.phase = TxPhase::Silence;
                        continue;
                    }
                    self.phase = TxPhase::Data(i + 1);
                    // Second half inverts the first relative to the line, never re-derived from the bit
                    if half % 2 == 1 {
                        return Some(Step::toggle(self.symbol_us));
                    }
                    let first_half = if self.frame.bit(half / 2) {
                        Level::Low
                    } else {
                        Level::High
                    };
                    return Some(Step::set(first_half, self.symbol_us));
                }

                TxPhase::Silence => {
                    self.phase = TxPhase::Done;
                    return Some(Step::set(Level::Low, timing::INTER_FRAME_SILENCE_US));
                }

                TxPhase::Done => return None,
            }
        }
    }
}

/// Steps of one transmission of `frame`
pub fn transmission_steps(frame: Frame, kind: TransmissionKind, symbol_us: u16) -> TransmissionSteps {
    TransmissionSteps::new(frame, kind, symbol_us)
}

/// Number of steps (holds) in one transmission
pub const fn step_count(kind: TransmissionKind) -> usize {
    let wakeup = if kind.has_hardware_wakeup() { 3 } else { 0 };
    wakeup + kind.sync_count() as usize * 2 + 2 + DATA_HALF_BITS + 1
}

/// Exact on-air duration of one transmission
pub const fn transmission_duration_us(kind: TransmissionKind, symbol_us: u16) -> u32 {
    let symbol = symbol_us as u32;
    let wakeup = if kind.has_hardware_wakeup() {
        timing::WAKEUP_HIGH_US as u32 + timing::WAKEUP_LOW_US as u32 + timing::WAKEUP_EXTRA_LOW_US as u32
    } else {
        0
    };
    let sync = kind.sync_count() as u32 * 2 * symbol * timing::SYNC_PULSE_SYMBOLS as u32;
    let frame_start = timing::FRAME_START_HIGH_US as u32 + symbol;
    let data = DATA_HALF_BITS as u32 * symbol;

    wakeup + sync + frame_start + data + timing::INTER_FRAME_SILENCE_US as u32
}

/// Exact on-air duration of a full burst (first send plus repeats)
pub const fn burst_duration_us(symbol_us: u16) -> u32 {
    transmission_duration_us(TransmissionKind::First, symbol_us)
        + BURST_REPEATS as u32 * transmission_duration_us(TransmissionKind::Repeat, symbol_us)
}

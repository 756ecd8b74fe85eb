//! Hardware Abstraction Layer for the transmit line and bit timing

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::types::Level;

#[cfg(feature = "embassy-time")]
pub use embassy_time::Delay as EmbassyDelay;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Transmit line already owned by a burst in flight
    Busy,
    /// Invalid configuration
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::Busy => write!(f, "Transmitter busy"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Output line driving the OOK transmitter
pub trait TxLine {
    type Error: From<HalError>;

    /// Drive the line to an absolute level
    fn set_level(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Level the line was last driven to
    fn level(&self) -> Level;

    /// Invert the line relative to its current level
    fn toggle(&mut self) -> Result<(), Self::Error> {
        let current = self.level();
        self.set_level(current.inverted())
    }
}

/// Transmit line on top of an embedded-hal output pin.
///
/// `OutputPin` cannot be read back, so the driven level is tracked here.
pub struct EmbeddedHalTxLine<P> {
    pin: P,
    level: Level,
    inverted: bool,
}

impl<P> EmbeddedHalTxLine<P>
where
    P: OutputPin,
{
    /// Take ownership of the pin and drive it low (carrier off)
    pub fn new(pin: P, inverted: bool) -> Result<Self, HalError> {
        let mut line = Self {
            pin,
            level: Level::Low,
            inverted,
        };
        line.set_level(Level::Low)?;
        Ok(line)
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> TxLine for EmbeddedHalTxLine<P>
where
    P: OutputPin,
{
    type Error = HalError;

    fn set_level(&mut self, level: Level) -> Result<(), Self::Error> {
        let electrical = if self.inverted { level.inverted() } else { level };
        match electrical {
            Level::High => self.pin.set_high(),
            Level::Low => self.pin.set_low(),
        }
        .map_err(|_| HalError::GpioError)?;
        self.level = level;
        Ok(())
    }

    fn level(&self) -> Level {
        self.level
    }
}

/// Bit timer: drives a line and busy-waits exact microsecond holds.
///
/// Holds never yield; frame timing is only correct if nothing else runs
/// on this core while a transmission is in progress.
pub struct BitTimer<L, D> {
    line: L,
    delay: D,
}

impl<L, D> BitTimer<L, D>
where
    L: TxLine,
    D: DelayNs,
{
    pub fn new(line: L, delay: D) -> Self {
        Self { line, delay }
    }

    /// Set the line level immediately
    pub fn set_level(&mut self, level: Level) -> Result<(), L::Error> {
        self.line.set_level(level)
    }

    /// Invert the line relative to its current level
    pub fn toggle(&mut self) -> Result<(), L::Error> {
        self.line.toggle()
    }

    /// Busy-wait for `us` microseconds
    pub fn hold(&mut self, us: u16) {
        self.delay.delay_us(u32::from(us));
    }

    pub fn level(&self) -> Level {
        self.line.level()
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    /// Split back into line and delay
    pub fn release(self) -> (L, D) {
        (self.line, self.delay)
    }
}

/// Blocking spin delay for host targets
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug, Default)]
pub struct SpinDelay;

#[cfg(feature = "std")]
impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_nanos(u64::from(ns));
        while std::time::Instant::now() < deadline {
            core::hint::spin_loop();
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use std::sync::{Arc, Mutex};
    use std::vec::Vec;

    /// Constant-level stretch of the recorded waveform, one per hold
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Segment {
        pub level: Level,
        pub us: u32,
    }

    /// Write issued to the line
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum LineEvent {
        /// Absolute set to the given level
        Set(Level),
        /// Relative toggle; carries the level after the toggle
        Toggle(Level),
    }

    #[derive(Debug, Default)]
    struct TraceInner {
        level: Level,
        events: Vec<LineEvent>,
        segments: Vec<Segment>,
    }

    /// Shared waveform record written by `MockTxLine` and `MockDelay`
    #[derive(Clone, Debug, Default)]
    pub struct Trace {
        inner: Arc<Mutex<TraceInner>>,
    }

    impl Trace {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn level(&self) -> Level {
            self.inner.lock().unwrap().level
        }

        pub fn segments(&self) -> Vec<Segment> {
            self.inner.lock().unwrap().segments.clone()
        }

        pub fn events(&self) -> Vec<LineEvent> {
            self.inner.lock().unwrap().events.clone()
        }

        /// Sum of all recorded holds
        pub fn total_us(&self) -> u64 {
            self.inner
                .lock()
                .unwrap()
                .segments
                .iter()
                .map(|s| u64::from(s.us))
                .sum()
        }

        pub fn clear(&self) {
            let mut inner = self.inner.lock().unwrap();
            inner.events.clear();
            inner.segments.clear();
        }

        fn write(&self, event: LineEvent) {
            let mut inner = self.inner.lock().unwrap();
            inner.level = match event {
                LineEvent::Set(level) | LineEvent::Toggle(level) => level,
            };
            inner.events.push(event);
        }

        fn hold(&self, us: u32) {
            let mut inner = self.inner.lock().unwrap();
            let level = inner.level;
            inner.segments.push(Segment { level, us });
        }
    }

    /// Transmit line recording every write into a `Trace`
    #[derive(Clone, Debug, Default)]
    pub struct MockTxLine {
        trace: Trace,
    }

    impl MockTxLine {
        pub fn new(trace: Trace) -> Self {
            Self { trace }
        }

        pub fn trace(&self) -> &Trace {
            &self.trace
        }
    }

    impl TxLine for MockTxLine {
        type Error = HalError;

        fn set_level(&mut self, level: Level) -> Result<(), Self::Error> {
            self.trace.write(LineEvent::Set(level));
            Ok(())
        }

        fn level(&self) -> Level {
            self.trace.level()
        }

        fn toggle(&mut self) -> Result<(), Self::Error> {
            let next = self.trace.level().inverted();
            self.trace.write(LineEvent::Toggle(next));
            Ok(())
        }
    }

    /// Delay that records a segment at the current line level instead of waiting
    #[derive(Clone, Debug, Default)]
    pub struct MockDelay {
        trace: Trace,
    }

    impl MockDelay {
        pub fn new(trace: Trace) -> Self {
            Self { trace }
        }
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.trace.hold(ns / 1_000);
        }

        fn delay_us(&mut self, us: u32) {
            self.trace.hold(us);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.trace.hold(ms.saturating_mul(1_000));
        }
    }

    /// Line and delay sharing one trace
    pub fn recording_pair() -> (MockTxLine, MockDelay, Trace) {
        let trace = Trace::new();
        (MockTxLine::new(trace.clone()), MockDelay::new(trace.clone()), trace)
    }

    /// Error raised by a failing `MockPin`
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MockPinError;

    impl embedded_hal::digital::Error for MockPinError {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    /// Output pin recording the electrical levels written to it
    #[derive(Clone, Debug, Default)]
    pub struct MockPin {
        writes: Arc<Mutex<Vec<bool>>>,
        fail_after: Option<usize>,
    }

    impl MockPin {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pin whose every write fails
        pub fn failing() -> Self {
            Self::failing_after(0)
        }

        /// Pin that accepts `writes` writes, then fails every later one
        pub fn failing_after(writes: usize) -> Self {
            Self {
                fail_after: Some(writes),
                ..Self::default()
            }
        }

        /// Electrical levels written so far (true = high)
        pub fn writes(&self) -> Vec<bool> {
            self.writes.lock().unwrap().clone()
        }

        pub fn is_high(&self) -> bool {
            self.writes.lock().unwrap().last().copied().unwrap_or(false)
        }

        fn write(&mut self, high: bool) -> Result<(), MockPinError> {
            let mut writes = self.writes.lock().unwrap();
            if self.fail_after.is_some_and(|limit| writes.len() >= limit) {
                return Err(MockPinError);
            }
            writes.push(high);
            Ok(())
        }
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = MockPinError;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.write(false)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.write(true)
        }
    }
}

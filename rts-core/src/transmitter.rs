//! Frame transmitter and burst policy

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use portable_atomic::{AtomicU32, Ordering};

use crate::encoder::{transmission_steps, LineOp, Step};
use crate::hal::{BitTimer, HalError, TxLine};
use crate::types::{Frame, RtsConfig, TransmissionKind, BURST_REPEATS};

/// Renders RTS transmissions on a line it owns exclusively
pub struct FrameTransmitter<L, D> {
    timer: BitTimer<L, D>,
    symbol_us: u16,
}

impl<L, D> FrameTransmitter<L, D>
where
    L: TxLine,
    D: DelayNs,
{
    /// Create a transmitter owning `line`; the symbol length is fixed from here on.
    ///
    /// Fails with `HalError::InvalidConfig` unless the symbol is non-zero
    /// and its 4-symbol sync pulse fits a 16-bit hold.
    pub fn new(line: L, delay: D, config: &RtsConfig) -> Result<Self, HalError> {
        config.validate().map_err(|_reason| {
            #[cfg(feature = "defmt")]
            defmt::error!("❌ Rejected RTS config: {}", _reason);
            HalError::InvalidConfig
        })?;

        Ok(Self {
            timer: BitTimer::new(line, delay),
            symbol_us: config.symbol_us,
        })
    }

    pub fn symbol_us(&self) -> u16 {
        self.symbol_us
    }

    pub fn line(&self) -> &L {
        self.timer.line()
    }

    /// Emit one transmission of `frame`, blocking until its trailing silence has elapsed
    pub fn transmit(&mut self, frame: &Frame, kind: TransmissionKind) -> Result<(), L::Error> {
        for step in transmission_steps(*frame, kind, self.symbol_us) {
            self.play(step)?;
        }
        Ok(())
    }

    /// Emit the full burst: one first transmission, then the repeats
    pub fn send(&mut self, frame: &Frame) -> Result<(), L::Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("📡 RTS burst: {}", frame);

        self.transmit(frame, TransmissionKind::First)?;
        for _ in 0..BURST_REPEATS {
            self.transmit(frame, TransmissionKind::Repeat)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("📡 RTS burst done");
        Ok(())
    }

    /// Split back into line and delay
    pub fn release(self) -> (L, D) {
        self.timer.release()
    }

    fn play(&mut self, step: Step) -> Result<(), L::Error> {
        match step.op {
            LineOp::Set(level) => self.timer.set_level(level)?,
            LineOp::Toggle => self.timer.toggle()?,
            LineOp::Keep => {}
        }
        self.timer.hold(step.hold_us);
        Ok(())
    }
}

/// Transmitter shared between contexts.
///
/// A burst holds the critical section for its whole duration, so bursts
/// never interleave on the line; on single-core targets this also masks
/// interrupts for the burst. A nested send from inside a burst is
/// rejected with `HalError::Busy`.
pub struct SharedTransmitter<L, D> {
    inner: Mutex<RefCell<FrameTransmitter<L, D>>>,
    bursts: AtomicU32,
}

impl<L, D> SharedTransmitter<L, D>
where
    L: TxLine,
    D: DelayNs,
{
    pub const fn new(transmitter: FrameTransmitter<L, D>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(transmitter)),
            bursts: AtomicU32::new(0),
        }
    }

    /// Run a full burst with exclusive ownership of the line
    pub fn send(&self, frame: &Frame) -> Result<(), L::Error> {
        critical_section::with(|cs| {
            let mut transmitter = self
                .inner
                .borrow(cs)
                .try_borrow_mut()
                .map_err(|_| L::Error::from(HalError::Busy))?;
            transmitter.send(frame)?;
            self.bursts.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    /// Completed bursts since creation
    pub fn bursts_sent(&self) -> u32 {
        self.bursts.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> FrameTransmitter<L, D> {
        self.inner.into_inner().into_inner()
    }
}

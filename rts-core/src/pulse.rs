//! Diagnostic pulse on an arbitrary output pin
//!
//! Shares no state with frame transmission; the radio pin itself is never
//! accepted as a pulse target.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::command::CommandError;
use crate::hal::HalError;
use crate::types::RtsConfig;

/// Validated "drive pin high for a while" request
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseRequest {
    pub pin: u8,
    pub duration_ms: u32,
}

impl PulseRequest {
    /// Validate a pulse target against the configured pin range and the radio pin
    pub fn new(pin: u32, duration_ms: u32, config: &RtsConfig) -> Result<Self, CommandError> {
        if pin == u32::from(config.tx_pin) {
            return Err(CommandError::ReservedPin(config.tx_pin));
        }
        if pin < u32::from(config.pulse_pin_min) || pin > u32::from(config.pulse_pin_max) {
            return Err(CommandError::PinOutOfRange(pin));
        }

        Ok(Self {
            pin: pin as u8,
            duration_ms,
        })
    }
}

/// Board pins that may carry a diagnostic pulse
pub trait PinBank {
    type Pin: OutputPin;

    /// Output handle for pin number `pin`, if the board has one
    fn output(&mut self, pin: u8) -> Option<&mut Self::Pin>;
}

/// Drive `pin` low, then high for `duration_ms`, then low again
pub fn emit_pulse<P, D>(pin: &mut P, delay: &mut D, duration_ms: u32) -> Result<(), HalError>
where
    P: OutputPin,
    D: DelayNs,
{
    pin.set_low().map_err(|_| HalError::GpioError)?;
    pin.set_high().map_err(|_| HalError::GpioError)?;
    delay.delay_ms(duration_ms);
    pin.set_low().map_err(|_| HalError::GpioError)
}

/// Resolve the requested pin on `bank` and pulse it
pub fn run_pulse<B, D>(bank: &mut B, delay: &mut D, request: &PulseRequest) -> Result<(), HalError>
where
    B: PinBank,
    D: DelayNs,
{
    let pin = bank.output(request.pin).ok_or(HalError::InvalidConfig)?;

    #[cfg(feature = "defmt")]
    defmt::debug!("⚡ Pulse pin {} for {}ms", request.pin, request.duration_ms);

    emit_pulse(pin, delay, request.duration_ms)
}

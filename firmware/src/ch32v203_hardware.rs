//! CH32V203 Hardware Implementation
//!
//! Board pin `n` is GPIOB pin `n`; the 433.42 MHz transmitter sits on PB5.
//! USART1 (PA9 TX / PA10 RX, 115200 8N1) carries the command lines.
//! The core runs from the 8 MHz HSI.

use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};

use embedded_hal::digital::{ErrorType, OutputPin};
use rts_core::{EmbeddedHalTxLine, HalError, PinBank, RtsConfig};

const RCC_APB2PCENR: *mut u32 = 0x4002_1018 as *mut u32;
const RCC_IOPAEN: u32 = 1 << 2;
const RCC_IOPBEN: u32 = 1 << 3;
const RCC_USART1EN: u32 = 1 << 14;

const GPIOA_BASE: usize = 0x4001_0800;
const GPIOB_BASE: usize = 0x4001_0C00;
const GPIO_CFGLR: usize = 0x00;
const GPIO_CFGHR: usize = 0x04;
const GPIO_BSHR: usize = 0x10;
const GPIO_BCR: usize = 0x14;

/// Push-pull output, 50 MHz
const CFG_OUTPUT_PP: u32 = 0b0011;
/// Alternate function push-pull, 50 MHz
const CFG_AF_PP: u32 = 0b1011;

const USART1_BASE: usize = 0x4001_3800;
const USART_STATR: usize = 0x00;
const USART_DATAR: usize = 0x04;
const USART_BRR: usize = 0x08;
const USART_CTLR1: usize = 0x0C;
const USART_ORE: u32 = 1 << 3;
const USART_RXNE: u32 = 1 << 5;
const USART_TXE: u32 = 1 << 7;
/// UE | TE | RE
const USART_ENABLE: u32 = (1 << 13) | (1 << 3) | (1 << 2);
/// 8 MHz / (16 * 115200) = 4.34 -> mantissa 4, fraction 5
const USART_BRR_115200: u32 = 0x45;

/// Board pins usable by this firmware (GPIOB)
pub const BOARD_PINS: u8 = 16;

/// Configuration matching this board's pin map
pub fn board_config() -> RtsConfig {
    RtsConfig {
        pulse_pin_max: BOARD_PINS - 1,
        ..rts_core::default_config()
    }
}

fn reg(base: usize, offset: usize) -> *mut u32 {
    (base + offset) as *mut u32
}

fn configure_pin(base: usize, index: u8, cfg: u32) {
    let (cfgr, shift) = if index < 8 {
        (reg(base, GPIO_CFGLR), u32::from(index) * 4)
    } else {
        (reg(base, GPIO_CFGHR), u32::from(index - 8) * 4)
    };
    // SAFETY: single-threaded init, register address taken from the reference manual
    unsafe {
        let value = read_volatile(cfgr);
        write_volatile(cfgr, (value & !(0xF << shift)) | (cfg << shift));
    }
}

/// Push-pull GPIOB output pin
#[derive(Debug)]
pub struct BoardPin {
    index: u8,
}

impl BoardPin {
    fn new(index: u8) -> Self {
        configure_pin(GPIOB_BASE, index, CFG_OUTPUT_PP);
        Self { index }
    }
}

impl ErrorType for BoardPin {
    type Error = Infallible;
}

impl OutputPin for BoardPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        // SAFETY: BCR is write-only and only touches this pin's bit
        unsafe { write_volatile(reg(GPIOB_BASE, GPIO_BCR), 1 << self.index) };
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        // SAFETY: BSHR is write-only and only touches this pin's bit
        unsafe { write_volatile(reg(GPIOB_BASE, GPIO_BSHR), 1 << self.index) };
        Ok(())
    }
}

/// Transmit line driving the OOK module
pub type RadioLine = EmbeddedHalTxLine<BoardPin>;

/// GPIOB pins other than the radio pin, created on first use
pub struct PulsePins {
    pins: [Option<BoardPin>; BOARD_PINS as usize],
    reserved: u8,
}

impl PulsePins {
    fn new(reserved: u8) -> Self {
        Self {
            pins: Default::default(),
            reserved,
        }
    }
}

impl PinBank for PulsePins {
    type Pin = BoardPin;

    fn output(&mut self, pin: u8) -> Option<&mut BoardPin> {
        if pin == self.reserved {
            return None;
        }
        let slot = self.pins.get_mut(usize::from(pin))?;
        Some(slot.get_or_insert_with(|| BoardPin::new(pin)))
    }
}

/// Polled USART1.
///
/// The receive register holds a single byte and nothing drains it while a
/// burst masks interrupts or a pulse is held, so bytes sent meanwhile are
/// lost. The overrun flag is latched and handed to the caller.
pub struct Usart1 {
    overrun: bool,
}

impl Usart1 {
    fn new() -> Self {
        configure_pin(GPIOA_BASE, 9, CFG_AF_PP);
        // SAFETY: single-threaded init
        unsafe {
            write_volatile(reg(USART1_BASE, USART_BRR), USART_BRR_115200);
            write_volatile(reg(USART1_BASE, USART_CTLR1), USART_ENABLE);
        }
        Self { overrun: false }
    }

    /// Next received byte, if any
    pub fn read_byte(&mut self) -> Option<u8> {
        // SAFETY: reading STATR then DATAR is the documented receive
        // sequence; it also clears ORE
        unsafe {
            let status = read_volatile(reg(USART1_BASE, USART_STATR));
            if status & USART_ORE != 0 {
                self.overrun = true;
            }
            if status & (USART_RXNE | USART_ORE) == 0 {
                return None;
            }
            Some(read_volatile(reg(USART1_BASE, USART_DATAR)) as u8)
        }
    }

    /// Whether bytes were lost since the last call
    pub fn take_overrun(&mut self) -> bool {
        core::mem::take(&mut self.overrun)
    }

    /// Blocking write of one byte
    pub fn write_byte(&mut self, byte: u8) {
        // SAFETY: DATAR is written only once TXE is set
        unsafe {
            while read_volatile(reg(USART1_BASE, USART_STATR)) & USART_TXE == 0 {}
            write_volatile(reg(USART1_BASE, USART_DATAR), u32::from(byte));
        }
    }
}

impl core::fmt::Write for Usart1 {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        s.bytes().for_each(|b| self.write_byte(b));
        Ok(())
    }
}

/// CH32V203 hardware owned by the bridge
pub struct Ch32v203RtsHal {
    pub radio: RadioLine,
    pub pulse_pins: PulsePins,
    pub uart: Usart1,
}

impl Ch32v203RtsHal {
    /// Clock the peripherals, drive the radio low and open USART1
    pub fn init(config: &RtsConfig) -> Result<Self, HalError> {
        if config.tx_pin >= BOARD_PINS {
            return Err(HalError::InvalidConfig);
        }

        // SAFETY: single-threaded init
        unsafe {
            let enabled = read_volatile(RCC_APB2PCENR);
            write_volatile(RCC_APB2PCENR, enabled | RCC_IOPAEN | RCC_IOPBEN | RCC_USART1EN);
        }

        let radio = EmbeddedHalTxLine::new(BoardPin::new(config.tx_pin), false)?;

        #[cfg(feature = "defmt")]
        defmt::info!("🔌 CH32V203 HAL initialized, radio on PB{}", config.tx_pin);

        Ok(Self {
            radio,
            pulse_pins: PulsePins::new(config.tx_pin),
            uart: Usart1::new(),
        })
    }
}

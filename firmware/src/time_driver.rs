//! SysTick time driver for CH32V203
//!
//! SysTick counts HCLK/8, i.e. 1 MHz from the 8 MHz HSI, which matches the
//! `tick-hz-1_000_000` embassy-time setting. Only `now()` is provided: the
//! bridge busy-waits through `embassy_time::Delay` and never arms timers.

use core::ptr::{read_volatile, write_volatile};

use embassy_time_driver::{AlarmHandle, Driver};
use riscv::interrupt;
use riscv::register::mstatus;

const STK_CTLR: *mut u32 = 0xE000_F000 as *mut u32;
const STK_CNTL: *const u32 = 0xE000_F008 as *const u32;
const STK_CNTH: *const u32 = 0xE000_F00C as *const u32;
/// STE, clock source HCLK/8, free running
const STK_ENABLE: u32 = 1;

/// Free-running 64-bit SysTick counter
pub struct SysTickDriver;

impl SysTickDriver {
    /// Start the counter; must run before the first `Instant::now()`
    pub fn start() {
        // SAFETY: single write during init
        unsafe { write_volatile(STK_CTLR, STK_ENABLE) };
    }
}

impl Driver for SysTickDriver {
    fn now(&self) -> u64 {
        // SAFETY: read-only access to the counter registers
        unsafe {
            loop {
                let high = read_volatile(STK_CNTH);
                let low = read_volatile(STK_CNTL);
                if read_volatile(STK_CNTH) == high {
                    return (u64::from(high) << 32) | u64::from(low);
                }
            }
        }
    }

    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        None
    }

    fn set_alarm_callback(&self, _alarm: AlarmHandle, _callback: fn(*mut ()), _ctx: *mut ()) {}

    fn set_alarm(&self, _alarm: AlarmHandle, _timestamp: u64) -> bool {
        false
    }
}

embassy_time_driver::time_driver_impl!(static DRIVER: SysTickDriver = SysTickDriver);

/// Machine-interrupt mask for the single CH32V203 hart.
///
/// `SharedTransmitter` holds this for a whole burst (about 0.5 s at 640 us
/// symbols), so no ISR can stretch a hold mid-frame. USART1 keeps receiving
/// meanwhile but nothing drains it; see `Usart1::take_overrun`.
struct BurstCriticalSection;

critical_section::set_impl!(BurstCriticalSection);

unsafe impl critical_section::Impl for BurstCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let was_enabled = mstatus::read().mie();
        interrupt::disable();
        u8::from(was_enabled)
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        // Nested sections restore nothing
        if was_enabled != 0 {
            interrupt::enable();
        }
    }
}

#![no_std]

//! Firmware library: CH32V203 board support and the bridge task

pub use embassy_executor::Spawner;
pub use embassy_time::Delay;
pub use static_cell::StaticCell;

pub use rts_core::*;

// Re-export hardware implementations
pub use crate::ch32v203_hardware::*;
pub use crate::tasks::*;

/// Transmitter type shared with the bridge task
pub type BridgeTransmitter = SharedTransmitter<RadioLine, Delay>;

// Embassy tasks module
pub mod tasks {
    use core::fmt::Write;

    use super::*;

    /// Serial bridge: assembles lines from USART1, executes them, replies.
    ///
    /// Never awaits: a burst has to busy-wait anyway and this is the only
    /// task on the executor. Input sent while a burst or pulse runs
    /// overruns the UART; the affected line is answered with `E06`.
    #[embassy_executor::task]
    pub async fn bridge_task(
        transmitter: &'static BridgeTransmitter,
        mut pins: PulsePins,
        mut uart: Usart1,
        config: RtsConfig,
    ) {
        #[cfg(feature = "defmt")]
        defmt::info!("📤 Bridge task started");

        let controller = CommandController::new(config, transmitter);
        let mut buffer = LineBuffer::new();
        let mut delay = Delay;

        loop {
            let byte = uart.read_byte();
            if uart.take_overrun() {
                #[cfg(feature = "defmt")]
                defmt::warn!("⚠️ USART1 overrun");
                buffer.mark_overrun();
            }
            let Some(byte) = byte else {
                continue;
            };
            let Some(received) = buffer.push(byte) else {
                continue;
            };

            let outcome = match received {
                Ok(line) => controller.handle_line(&line, &mut pins, &mut delay),
                Err(error) => Outcome::Rejected(error),
            };

            #[cfg(feature = "defmt")]
            defmt::debug!("📡 {}", outcome);

            write!(uart, "{}\r\n", outcome).ok();
        }
    }
}

// CH32V203 hardware module
pub mod ch32v203_hardware;

// Time driver for embassy
pub mod time_driver;

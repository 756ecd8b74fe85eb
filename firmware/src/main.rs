#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;

// RISC-V runtime
use riscv_rt as _;

// Panic handler
use panic_halt as _;

use embassy_executor::Spawner;
use static_cell::StaticCell;

use rts_firmware::time_driver::SysTickDriver;
use rts_firmware::*;

// Static resources
static TRANSMITTER: StaticCell<BridgeTransmitter> = StaticCell::new();

/// Main firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("🔧 RTS Bridge Firmware Starting...");

    SysTickDriver::start();

    let config = board_config();
    #[cfg(feature = "defmt")]
    defmt::info!("⚙️ RTS config: {}", config);

    let hal = match Ch32v203RtsHal::init(&config) {
        Ok(hal) => hal,
        Err(_error) => {
            #[cfg(feature = "defmt")]
            defmt::error!("❌ Hardware init failed: {}", _error);
            return;
        }
    };
    #[cfg(feature = "defmt")]
    defmt::info!("✅ Hardware initialized");

    let Ch32v203RtsHal {
        radio,
        pulse_pins,
        uart,
    } = hal;

    let transmitter = match FrameTransmitter::new(radio, Delay, &config) {
        Ok(transmitter) => TRANSMITTER.init(SharedTransmitter::new(transmitter)),
        Err(_error) => {
            #[cfg(feature = "defmt")]
            defmt::error!("❌ Transmitter config rejected: {}", _error);
            return;
        }
    };

    spawner.must_spawn(bridge_task(transmitter, pulse_pins, uart, config));

    #[cfg(feature = "defmt")]
    defmt::info!("✨ RTS bridge ready!");
}

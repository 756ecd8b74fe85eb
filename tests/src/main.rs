// Host-side smoke run of the RTS transport against the recording mocks

use rts_core::encoder::{burst_duration_us, transmission_duration_us};
use rts_core::hal::mock::{recording_pair, MockPin};
use rts_core::test_utils::{frames, waveform};
use rts_core::{
    default_config, CommandController, FrameTransmitter, LineBuffer, Outcome, PinBank,
    SharedTransmitter, TransmissionKind,
};
use rts_tests::record_burst;

struct BoardPins([MockPin; 20]);

impl PinBank for BoardPins {
    type Pin = MockPin;

    fn output(&mut self, pin: u8) -> Option<&mut MockPin> {
        self.0.get_mut(usize::from(pin))
    }
}

fn main() {
    println!("🧪 RTS Transport Smoke Run (core v{})", rts_core::VERSION);

    test_burst_timing();
    test_burst_decoding();
    test_command_session();

    println!("✅ All smoke checks passed!");
    println!();
    println!("📝 Run the full suite with: cargo test");
}

/// Check the documented durations at the default symbol length
fn test_burst_timing() {
    println!("⏱️ Testing burst timing...");

    let symbol = default_config().symbol_us;
    let first = transmission_duration_us(TransmissionKind::First, symbol);
    let repeat = transmission_duration_us(TransmissionKind::Repeat, symbol);
    let burst = burst_duration_us(symbol);

    println!("  first: {}us, repeat: {}us, burst: {}us", first, repeat, burst);
    assert_eq!(first, 216_505);
    assert_eq!(repeat, 143_125);
    assert_eq!(burst, first + 2 * repeat);

    println!("  ✅ Timing matches");
}

/// Record a burst and decode it back
fn test_burst_decoding() {
    println!("📡 Testing burst decoding...");

    let config = default_config();
    let segments = record_burst(&frames::SAMPLE, &config);
    let decoded = waveform::decode_burst(&segments, config.symbol_us).expect("burst decodes");

    for transmission in &decoded {
        println!(
            "  {:?}: {} sync pulses, frame {}",
            transmission.kind, transmission.sync_pulses, transmission.frame
        );
        assert_eq!(transmission.frame, frames::SAMPLE);
    }
    assert_eq!(decoded.len(), 3);

    println!("  ✅ Burst decodes to the sent frame");
}

/// Feed a serial session through the controller
fn test_command_session() {
    println!("⌨️ Testing command session...");

    let config = default_config();
    let (line, delay, _trace) = recording_pair();
    let transmitter = SharedTransmitter::new(FrameTransmitter::new(line, delay, &config).unwrap());
    let controller = CommandController::new(config, &transmitter);
    let mut pins = BoardPins(Default::default());
    let (_, mut pulse_delay, _) = recording_pair();
    let mut buffer = LineBuffer::new();

    let input = b"a71a2b3c4d5e6f\nA71A\nPULSE(5,10)\nPULSE(8,10)\n";
    let mut accepted = 0;
    for byte in input {
        let Some(received) = buffer.push(*byte) else {
            continue;
        };
        let outcome = match received {
            Ok(line) => controller.handle_line(&line, &mut pins, &mut pulse_delay),
            Err(error) => Outcome::Rejected(error),
        };
        println!("  > {}", outcome.to_string().replace("\r\n", " | "));
        if outcome.is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 2);
    assert_eq!(transmitter.bursts_sent(), 1);
    assert_eq!(pins.0[8].writes(), [false, true, false]);

    println!("  ✅ Command session behaves");
}

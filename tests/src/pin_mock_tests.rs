//! Pin-level expectations checked with embedded-hal-mock

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
use rts_core::test_utils::frames;
use rts_core::{emit_pulse, EmbeddedHalTxLine, Frame, FrameTransmitter, RtsConfig, TransmissionKind};

fn set(state: PinState) -> PinTransaction {
    PinTransaction::set(state)
}

/// Electrical writes expected for one transmission, line starting low
fn expected_writes(frame: &Frame, kind: TransmissionKind) -> Vec<PinTransaction> {
    let mut writes = Vec::new();

    if kind.has_hardware_wakeup() {
        // The extra low hold is a keep: no write
        writes.push(set(PinState::High));
        writes.push(set(PinState::Low));
    }
    for _ in 0..kind.sync_count() {
        writes.push(set(PinState::High));
        writes.push(set(PinState::Low));
    }
    writes.push(set(PinState::High));
    writes.push(set(PinState::Low));

    for bit in frame.bits() {
        if bit {
            writes.push(set(PinState::Low));
            writes.push(set(PinState::High));
        } else {
            writes.push(set(PinState::High));
            writes.push(set(PinState::Low));
        }
    }

    writes.push(set(PinState::Low));
    writes
}

#[test]
fn test_line_init_drives_low() {
    let mut pin = PinMock::new(&[set(PinState::Low)]);
    let line = EmbeddedHalTxLine::new(pin.clone(), false).unwrap();
    drop(line);
    pin.done();
}

#[test]
fn test_inverted_line_init_drives_high() {
    let mut pin = PinMock::new(&[set(PinState::High)]);
    let line = EmbeddedHalTxLine::new(pin.clone(), true).unwrap();
    drop(line);
    pin.done();
}

#[test]
fn test_repeat_transmission_pin_writes() {
    let mut expectations = vec![set(PinState::Low)];
    expectations.extend(expected_writes(&frames::SAMPLE, TransmissionKind::Repeat));
    assert_eq!(expectations.len(), 1 + 14 + 2 + 112 + 1);

    let mut pin = PinMock::new(&expectations);
    let line = EmbeddedHalTxLine::new(pin.clone(), false).unwrap();
    let mut tx = FrameTransmitter::new(line, NoopDelay::new(), &RtsConfig::default()).unwrap();

    tx.transmit(&frames::SAMPLE, TransmissionKind::Repeat).unwrap();

    let (line, _delay) = tx.release();
    drop(line.release());
    pin.done();
}

#[test]
fn test_full_burst_pin_writes() {
    let mut expectations = vec![set(PinState::Low)];
    expectations.extend(expected_writes(&frames::SAMPLE, TransmissionKind::First));
    expectations.extend(expected_writes(&frames::SAMPLE, TransmissionKind::Repeat));
    expectations.extend(expected_writes(&frames::SAMPLE, TransmissionKind::Repeat));

    let mut pin = PinMock::new(&expectations);
    let line = EmbeddedHalTxLine::new(pin.clone(), false).unwrap();
    let mut tx = FrameTransmitter::new(line, NoopDelay::new(), &RtsConfig::default()).unwrap();

    tx.send(&frames::SAMPLE).unwrap();

    drop(tx);
    pin.done();
}

#[test]
fn test_edge_case_frames_pin_writes() {
    for frame in frames::EDGE_CASES {
        let mut expectations = vec![set(PinState::Low)];
        expectations.extend(expected_writes(&frame, TransmissionKind::Repeat));

        let mut pin = PinMock::new(&expectations);
        let line = EmbeddedHalTxLine::new(pin.clone(), false).unwrap();
        let mut tx = FrameTransmitter::new(line, NoopDelay::new(), &RtsConfig::default()).unwrap();

        tx.transmit(&frame, TransmissionKind::Repeat).unwrap();

        drop(tx);
        pin.done();
    }
}

#[test]
fn test_pulse_pin_writes() {
    let mut pin = PinMock::new(&[set(PinState::Low), set(PinState::High), set(PinState::Low)]);

    emit_pulse(&mut pin, &mut NoopDelay::new(), 100).unwrap();

    pin.done();
}

#[test]
fn test_zero_length_pulse_pin_writes() {
    let mut pin = PinMock::new(&[set(PinState::Low), set(PinState::High), set(PinState::Low)]);

    emit_pulse(&mut pin, &mut NoopDelay::new(), 0).unwrap();

    pin.done();
}

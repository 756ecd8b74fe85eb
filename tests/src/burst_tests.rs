//! Burst structure and exact timing at several symbol lengths

use rstest::rstest;
use rts_core::encoder::{burst_duration_us, transmission_duration_us};
use rts_core::hal::mock::recording_pair;
use rts_core::test_utils::{frames, waveform};
use rts_core::{timing, FrameTransmitter, HalError, Level, TransmissionKind};

use crate::{config_with_symbol, record_burst, record_transmission};

#[test]
fn test_sample_first_transmission_exact_duration() {
    let segments = record_transmission(&frames::SAMPLE, TransmissionKind::First, &config_with_symbol(640));
    let total: u64 = segments.iter().map(|s| u64::from(s.us)).sum();

    let expected = 65535 + 24030 + 9415 + 2 * (4 * 640 * 2) + (4550 + 640) + 71680 + 30415;
    assert_eq!(total, expected);
    assert_eq!(total, 216_505);
}

#[test]
fn test_sample_data_phase_duration() {
    let segments = record_transmission(&frames::SAMPLE, TransmissionKind::Repeat, &config_with_symbol(640));

    // 14 sync holds + 2 frame start holds precede the data
    let data: u64 = segments[16..16 + 112].iter().map(|s| u64::from(s.us)).sum();
    assert_eq!(data, 71_680);
}

#[rstest]
#[case(320)]
#[case(500)]
#[case(640)]
#[case(1280)]
fn test_burst_shape(#[case] symbol_us: u16) {
    let segments = record_burst(&frames::SAMPLE, &config_with_symbol(symbol_us));
    let decoded = waveform::decode_burst(&segments, symbol_us).unwrap();

    assert_eq!(decoded.len(), 3);
    assert_eq!(
        decoded.iter().map(|d| d.kind).collect::<Vec<_>>(),
        [TransmissionKind::First, TransmissionKind::Repeat, TransmissionKind::Repeat]
    );
    assert_eq!(
        decoded.iter().map(|d| d.sync_pulses).collect::<Vec<_>>(),
        [2, 7, 7]
    );
    assert!(decoded.iter().all(|d| d.frame == frames::SAMPLE));
    assert!(decoded.iter().all(|d| d.data_holds == 112));

    let total: u64 = segments.iter().map(|s| u64::from(s.us)).sum();
    assert_eq!(total, u64::from(burst_duration_us(symbol_us)));
    assert_eq!(
        decoded[0].duration_us,
        u64::from(transmission_duration_us(TransmissionKind::First, symbol_us))
    );
}

#[rstest]
#[case(TransmissionKind::First, 3)]
#[case(TransmissionKind::Repeat, 0)]
fn test_wakeup_only_on_first(#[case] kind: TransmissionKind, #[case] wakeup_holds: usize) {
    let segments = record_transmission(&frames::SAMPLE, kind, &config_with_symbol(640));

    let wakeup = segments
        .iter()
        .filter(|s| s.us == 9415 || s.us == 24030 || s.us == 65535)
        .count();
    assert_eq!(wakeup, wakeup_holds);
}

#[test]
fn test_line_low_between_transmissions() {
    let segments = record_burst(&frames::SAMPLE, &config_with_symbol(640));
    let runs = waveform::split_transmissions(&segments);

    assert_eq!(runs.len(), 3);
    for run in runs {
        let last = run.last().unwrap();
        assert_eq!(last.level, Level::Low);
        assert_eq!(last.us, 30415);
    }
}

#[test]
fn test_edge_case_frames_round_trip() {
    for frame in frames::EDGE_CASES {
        let segments = record_burst(&frame, &config_with_symbol(640));
        let decoded = waveform::decode_burst(&segments, 640).unwrap();
        assert!(decoded.iter().all(|d| d.frame == frame));
    }
}

#[rstest]
#[case(0)]
#[case(16384)]
#[case(20000)]
#[case(u16::MAX)]
fn test_unrepresentable_symbol_rejected(#[case] symbol_us: u16) {
    let (line, delay, trace) = recording_pair();

    let result = FrameTransmitter::new(line, delay, &config_with_symbol(symbol_us));

    assert!(matches!(result, Err(HalError::InvalidConfig)));
    assert!(trace.segments().is_empty());
}

#[test]
fn test_largest_symbol_matches_duration_accounting() {
    let symbol_us = timing::MAX_SYMBOL_US;
    let segments = record_transmission(&frames::SAMPLE, TransmissionKind::Repeat, &config_with_symbol(symbol_us));

    assert_eq!(segments[0].us, 4 * u32::from(symbol_us));
    let total: u64 = segments.iter().map(|s| u64::from(s.us)).sum();
    assert_eq!(total, u64::from(transmission_duration_us(TransmissionKind::Repeat, symbol_us)));
}

//! Shared transmitter under concurrent senders

use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use rts_core::hal::mock::{recording_pair, MockDelay, MockTxLine};
use rts_core::hal::SpinDelay;
use rts_core::test_utils::waveform;
use rts_core::{Frame, FrameTransmitter, RtsConfig, SharedTransmitter, TransmissionKind};
use tokio_test::assert_ok;

/// Recording delay that yields the thread on every hold so other senders get a chance to run
struct YieldingDelay(MockDelay);

impl DelayNs for YieldingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.delay_ns(ns);
        std::thread::yield_now();
    }

    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us);
        std::thread::yield_now();
    }
}

type Shared = SharedTransmitter<MockTxLine, YieldingDelay>;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bursts_never_interleave() {
    let config = RtsConfig::default();
    let (line, delay, trace) = recording_pair();
    let transmitter = FrameTransmitter::new(line, YieldingDelay(delay), &config).unwrap();
    let shared: Arc<Shared> = Arc::new(SharedTransmitter::new(transmitter));

    let a = Frame::new([0x11; 7]);
    let b = Frame::new([0xEE; 7]);

    let handles: Vec<_> = [a, b]
        .into_iter()
        .map(|frame| {
            let shared = Arc::clone(&shared);
            tokio::task::spawn_blocking(move || shared.send(&frame))
        })
        .collect();
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    assert_eq!(shared.bursts_sent(), 2);

    let decoded = waveform::decode_burst(&trace.segments(), config.symbol_us).unwrap();
    assert_eq!(decoded.len(), 6);
    for burst in decoded.chunks(3) {
        assert_eq!(burst[0].kind, TransmissionKind::First);
        assert_eq!(burst[1].kind, TransmissionKind::Repeat);
        assert_eq!(burst[2].kind, TransmissionKind::Repeat);
        assert!(burst.iter().all(|d| d.frame == burst[0].frame));
    }
    let mut sent: Vec<_> = decoded.iter().step_by(3).map(|d| d.frame).collect();
    sent.sort_by_key(|f| f.as_bytes()[0]);
    assert_eq!(sent, [a, b]);
}

#[tokio::test]
async fn test_sequential_sends_count_bursts() {
    let (line, delay, trace) = recording_pair();
    let shared = SharedTransmitter::new(FrameTransmitter::new(line, delay, &RtsConfig::default()).unwrap());

    for _ in 0..3 {
        assert_ok!(shared.send(&Frame::new([0x5A; 7])));
        tokio::task::yield_now().await;
    }

    assert_eq!(shared.bursts_sent(), 3);
    assert_eq!(waveform::decode_burst(&trace.segments(), 640).unwrap().len(), 9);
}

#[test]
fn test_spin_delay_waits_at_least_requested() {
    let mut delay = SpinDelay;

    let start = Instant::now();
    delay.delay_us(2_000);
    assert!(start.elapsed() >= Duration::from_micros(2_000));

    let start = Instant::now();
    delay.delay_ns(500_000);
    assert!(start.elapsed() >= Duration::from_micros(500));
}

//! Test utilities for RTS transport functionality

pub mod waveform {
    //! Decoding of recorded waveforms back into transmissions

    use crate::hal::mock::Segment;
    use crate::types::{timing, Frame, Level, TransmissionKind, FRAME_BITS, FRAME_LEN};
    use std::vec::Vec;

    /// One transmission recovered from a waveform
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DecodedTransmission {
        pub kind: TransmissionKind,
        pub sync_pulses: usize,
        pub frame: Frame,
        pub data_holds: usize,
        pub duration_us: u64,
    }

    /// Why a segment run does not look like a transmission
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DecodeError {
        Truncated,
        BadSync(usize),
        BadFrameStart(usize),
        BadDataBit(usize),
        BadSilence(usize),
    }

    fn matches(segment: Option<&Segment>, level: Level, us: u32) -> bool {
        segment.is_some_and(|s| s.level == level && s.us == us)
    }

    /// Split a burst after every trailing silence
    pub fn split_transmissions(segments: &[Segment]) -> Vec<&[Segment]> {
        segments
            .split_inclusive(|s| s.level == Level::Low && s.us == u32::from(timing::INTER_FRAME_SILENCE_US))
            .filter(|run| !run.is_empty())
            .collect()
    }

    /// Decode one transmission recorded with `symbol_us`
    pub fn decode_transmission(segments: &[Segment], symbol_us: u16) -> Result<DecodedTransmission, DecodeError> {
        let symbol = u32::from(symbol_us);
        let sync_us = symbol * u32::from(timing::SYNC_PULSE_SYMBOLS);
        let mut i = 0;

        let wakeup = matches(segments.first(), Level::High, u32::from(timing::WAKEUP_HIGH_US));
        if wakeup {
            if !matches(segments.get(1), Level::Low, u32::from(timing::WAKEUP_LOW_US))
                || !matches(segments.get(2), Level::Low, u32::from(timing::WAKEUP_EXTRA_LOW_US))
            {
                return Err(DecodeError::BadSync(1));
            }
            i = 3;
        }

        let mut sync_pulses = 0;
        while matches(segments.get(i), Level::High, sync_us) {
            if !matches(segments.get(i + 1), Level::Low, sync_us) {
                return Err(DecodeError::BadSync(i + 1));
            }
            sync_pulses += 1;
            i += 2;
        }

        let kind = match TransmissionKind::from_sync_count(sync_pulses as u8) {
            Some(kind) if kind.has_hardware_wakeup() == wakeup => kind,
            _ => return Err(DecodeError::BadSync(i)),
        };

        if !matches(segments.get(i), Level::High, u32::from(timing::FRAME_START_HIGH_US))
            || !matches(segments.get(i + 1), Level::Low, symbol)
        {
            return Err(DecodeError::BadFrameStart(i));
        }
        i += 2;

        let data = segments.get(i..i + FRAME_BITS * 2).ok_or(DecodeError::Truncated)?;
        let mut bytes = [0u8; FRAME_LEN];
        for (bit, pair) in data.chunks(2).enumerate() {
            let (first, second) = (pair[0], pair[1]);
            if first.us != symbol || second.us != symbol || first.level == second.level {
                return Err(DecodeError::BadDataBit(bit));
            }
            if first.level == Level::Low {
                bytes[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        i += FRAME_BITS * 2;

        if !matches(segments.get(i), Level::Low, u32::from(timing::INTER_FRAME_SILENCE_US)) {
            return Err(DecodeError::BadSilence(i));
        }

        Ok(DecodedTransmission {
            kind,
            sync_pulses,
            frame: Frame::new(bytes),
            data_holds: data.len(),
            duration_us: segments[..=i].iter().map(|s| u64::from(s.us)).sum(),
        })
    }

    /// Decode every transmission of a burst
    pub fn decode_burst(segments: &[Segment], symbol_us: u16) -> Result<Vec<DecodedTransmission>, DecodeError> {
        split_transmissions(segments)
            .into_iter()
            .map(|run| decode_transmission(run, symbol_us))
            .collect()
    }
}

pub mod frames {
    //! Sample frames

    use crate::types::Frame;

    /// Frame used throughout the transport examples
    pub const SAMPLE: Frame = Frame::new([0xA7, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E, 0x6F]);

    /// Frames exercising constant and alternating bit runs
    pub const EDGE_CASES: [Frame; 4] = [
        Frame::new([0x00; 7]),
        Frame::new([0xFF; 7]),
        Frame::new([0xAA; 7]),
        Frame::new([0x55; 7]),
    ];
}

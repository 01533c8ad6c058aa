use super::*;
use crate::{build_frame, Frame};

/// Feed `frame` to `rx` as an ideal line: a few idle ticks, then each bit
/// held for one full bit period, then idle until the engine settles.
fn feed(rx: &mut RxEngine, levels: &[bool], parity: ParityMode) -> Vec<RxTick> {
    let mut ticks = Vec::new();
    for _ in 0..4 {
        ticks.push(rx.clock(true, 1, parity));
    }
    for &level in levels {
        for _ in 0..OVERSAMPLE {
            ticks.push(rx.clock(level, 1, parity));
        }
    }
    for _ in 0..OVERSAMPLE {
        ticks.push(rx.clock(true, 1, parity));
    }
    ticks
}

fn levels(frame: &Frame) -> Vec<bool> {
    (0..frame.len()).map(|i| frame.bit(i)).collect()
}

#[test]
fn decodes_ascii_a_with_even_parity() {
    let frame = build_frame(0x41, ParityMode::Even);
    let mut rx = RxEngine::new();
    let ticks = feed(&mut rx, &levels(&frame), ParityMode::Even);

    assert_eq!(rx.state(), RxState::Done);
    assert_eq!(rx.byte(), Some(0x41));
    assert!(rx.errors().is_empty());
    assert_eq!(ticks.iter().filter(|t| t.finished).count(), 1);
    // One centre sample per bit: start, 8 data, parity, stop.
    assert_eq!(ticks.iter().filter(|t| t.sampled.is_some()).count(), 11);
}

#[test]
fn samples_land_on_count_eight() {
    let frame = build_frame(0xA5, ParityMode::None);
    let mut rx = RxEngine::new();
    rx.clock(true, 1, ParityMode::None);
    rx.clock(false, 1, ParityMode::None);
    assert_eq!(rx.state(), RxState::Start);
    assert_eq!(rx.oversample_count(), 0);

    for i in 1..MID_BIT {
        let t = rx.clock(frame.bit(0), 1, ParityMode::None);
        assert_eq!(t.sampled, None, "increment {i}");
    }
    let t = rx.clock(frame.bit(0), 1, ParityMode::None);
    assert_eq!(t.sampled, Some(false));
    assert_eq!(rx.state(), RxState::Data);
    assert_eq!(rx.oversample_count(), MID_BIT);
}

#[test]
fn short_glitch_is_a_silent_false_start() {
    let mut rx = RxEngine::new();
    rx.clock(false, 1, ParityMode::Even);
    assert_eq!(rx.state(), RxState::Start);

    let mut saw_false_start = false;
    for _ in 0..MID_BIT {
        let t = rx.clock(true, 1, ParityMode::Even);
        saw_false_start |= t.false_start;
    }
    assert!(saw_false_start);
    assert_eq!(rx.state(), RxState::Idle);
    assert!(rx.errors().is_empty());
    assert_eq!(rx.byte(), None);

    // The engine is immediately ready for a real frame.
    let frame = build_frame(0x3C, ParityMode::Even);
    feed(&mut rx, &levels(&frame), ParityMode::Even);
    assert_eq!(rx.byte(), Some(0x3C));
}

#[test]
fn low_stop_bit_is_a_frame_error() {
    let frame = build_frame(0x7E, ParityMode::None);
    let mut bits = levels(&frame);
    let stop = frame.stop_index();
    bits[stop] = false;

    let mut rx = RxEngine::new();
    feed(&mut rx, &bits, ParityMode::None);
    assert_eq!(rx.byte(), Some(0x7E));
    assert!(rx.errors().frame_error());
    assert!(!rx.errors().parity_error());
    assert!(rx.errors().any());
}

#[test]
fn flipped_parity_bit_is_a_parity_error() {
    for mode in [ParityMode::Even, ParityMode::Odd] {
        let frame = build_frame(0x96, mode);
        let mut bits = levels(&frame);
        bits[crate::PARITY_INDEX] = !bits[crate::PARITY_INDEX];

        let mut rx = RxEngine::new();
        feed(&mut rx, &bits, mode);
        assert_eq!(rx.byte(), Some(0x96), "{mode:?}");
        assert_eq!(rx.errors(), RxErrors::PARITY, "{mode:?}");
        assert_eq!(rx.received_parity(), !frame.parity_bit().unwrap());
    }
}

#[test]
fn double_advance_still_samples_once_per_bit() {
    let frame = build_frame(0xFF, ParityMode::None);
    let mut rx = RxEngine::new();
    rx.clock(false, 1, ParityMode::None);
    // Jump 7 -> 9 in one call: the centre at 8 must still be sampled.
    for _ in 0..6 {
        rx.clock(frame.bit(0), 1, ParityMode::None);
    }
    assert_eq!(rx.oversample_count(), 6);
    rx.clock(frame.bit(0), 1, ParityMode::None);
    let t = rx.clock(frame.bit(0), 2, ParityMode::None);
    assert_eq!(t.sampled, Some(false));
    assert_eq!(rx.oversample_count(), 9);
    assert_eq!(rx.state(), RxState::Data);
}

#[test]
fn zero_advance_freezes_the_receiver() {
    let mut rx = RxEngine::new();
    rx.clock(false, 1, ParityMode::None);
    let before = rx.clone();
    for _ in 0..20 {
        assert_eq!(rx.clock(true, 0, ParityMode::None), RxTick::default());
    }
    assert_eq!(rx, before);
}

#[test]
fn counters_stay_in_range() {
    let frame = build_frame(0x5A, ParityMode::Odd);
    let mut rx = RxEngine::new();
    rx.clock(true, 1, ParityMode::Odd);
    for &level in &levels(&frame) {
        for _ in 0..OVERSAMPLE {
            rx.clock(level, 1, ParityMode::Odd);
            assert!(rx.oversample_count() < OVERSAMPLE);
            assert!(rx.bit_count() as usize <= DATA_BITS);
        }
    }
    assert_eq!(rx.byte(), Some(0x5A));
}

#[test]
fn done_ignores_the_line_until_reset() {
    let frame = build_frame(0x01, ParityMode::None);
    let mut rx = RxEngine::new();
    feed(&mut rx, &levels(&frame), ParityMode::None);
    assert!(rx.is_done());
    for level in [false, true, false, false] {
        rx.clock(level, 1, ParityMode::None);
    }
    assert_eq!(rx.byte(), Some(0x01));

    rx.reset();
    assert_eq!(rx, RxEngine::new());
    assert_eq!(rx.shift_register(), 0);
    assert_eq!(rx.byte(), None);
}

//! Integration tests for the time wheel and how the form composes its value
//!
//! These drive `WheelState` with the offsets a scroll area would report,
//! without opening a window.

use wheel_alarm::wheel::{Phase, Wheel, WheelState, ROW_HEIGHT};
use wheel_alarm::TimeOfDay;

fn rows(n: i32) -> f32 {
    n as f32 * ROW_HEIGHT
}

// scrolls to `offset` and lets it come to rest
fn fling(state: &mut WheelState, offset: f32) -> Option<u8> {
    state.observe(offset, true);
    state.observe(offset, false)
}

#[test]
fn minute_wheel_scenario() {
    let mut state = WheelState::new(Wheel::minutes(), 45);
    assert_eq!(state.take_scroll_request(), Some(rows(60 + 45)));

    // settle inside the middle copy: value reported, no jump
    assert_eq!(fling(&mut state, rows(60 + 3)), Some(3));
    assert_eq!(state.take_scroll_request(), None);

    // settle in the first copy: value reported, then moved to the middle
    assert_eq!(fling(&mut state, rows(5)), Some(5));
    assert_eq!(state.take_scroll_request(), Some(rows(65)));
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn scrolling_past_the_end_keeps_looping() {
    let mut state = WheelState::new(Wheel::minutes(), 58);
    state.take_scroll_request();

    // one row past 59 wraps round to 00
    assert_eq!(fling(&mut state, rows(60 + 60)), Some(0));
    assert_eq!(state.take_scroll_request(), Some(rows(60)));
    assert_eq!(fling(&mut state, rows(60 + 1)), Some(1));
}

#[test]
fn settling_on_the_same_value_reports_nothing() {
    let mut state = WheelState::new(Wheel::minutes(), 10);
    state.take_scroll_request();
    // the same minute in the last copy
    assert_eq!(fling(&mut state, rows(120 + 10)), None);
    assert_eq!(state.take_scroll_request(), Some(rows(70)));
    assert_eq!(state.value(), 10);
}

#[test]
fn hour_wheel_with_period_toggle() {
    let mut state = WheelState::new(Wheel::hours(), 11);
    state.take_scroll_request();
    assert_eq!(fling(&mut state, rows(12 + 11)), Some(12));

    // the wheel only knows 12, the period decides the hour
    assert_eq!(TimeOfDay::AM.to_24_hour(state.value()), 0);
    assert_eq!(TimeOfDay::PM.to_24_hour(state.value()), 12);

    // one more row wraps to 1, not 13
    assert_eq!(fling(&mut state, rows(24)), Some(1));
    assert_eq!(TimeOfDay::PM.to_24_hour(state.value()), 13);
}

#[test]
fn twenty_four_hour_wheel() {
    let wheel = Wheel::range(23);
    assert_eq!(wheel.initial_offset(0), rows(24));
    assert_eq!(wheel.value_at(rows(24 + 23)), 23);
    assert_eq!(wheel.value_at(rows(48)), 0);
    assert_eq!(wheel.settle(rows(50)).offset, rows(26));
}

#[test]
fn loop_consistency_across_the_whole_list() {
    for wheel in [Wheel::hours(), Wheel::minutes(), Wheel::range(23)] {
        let len = wheel.len() as i32;
        for row in 0..2 * len {
            assert_eq!(wheel.value_at(rows(row)), wheel.value_at(rows(row + len)));
        }
    }
}

//! Scroll model of the looping time wheel.
//!
//! The wheel renders its base range `COPIES` times end to end and maps a
//! vertical scroll offset back onto the base range. Whenever scrolling comes
//! to rest outside the middle copy the offset is moved by a whole copy, which
//! lands on an identical row, so the list never appears to end.
//!
//! Nothing in here knows about egui; [`crate::widgets::TimeWheel`] feeds
//! offsets in and applies the scroll requests that come out.

/// height of a single row
pub const ROW_HEIGHT: f32 = 50.0;
/// how many times the base range is repeated
pub const COPIES: usize = 3;
/// rows visible at once, the middle one is the selection
pub const VISIBLE_ROWS: usize = 5;

// offsets closer than this are treated as the same position
const OFFSET_EPSILON: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelKind {
    /// `01..=12`, the hour half of a 12 hour clock
    Hours12,
    /// `00..=max`
    Range { max: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wheel {
    kind: WheelKind,
}

/// Where the wheel comes to rest after a scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settle {
    pub value: u8,
    /// snapped to a row and moved into the middle copy
    pub offset: f32,
}

impl Wheel {
    #[must_use]
    pub const fn new(kind: WheelKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub const fn hours() -> Self {
        Self::new(WheelKind::Hours12)
    }

    #[must_use]
    pub const fn minutes() -> Self {
        Self::range(59)
    }

    #[must_use]
    pub const fn range(max: u8) -> Self {
        Self::new(WheelKind::Range { max })
    }

    const fn low(&self) -> u8 {
        match self.kind {
            WheelKind::Hours12 => 1,
            WheelKind::Range { .. } => 0,
        }
    }

    const fn high(&self) -> u8 {
        match self.kind {
            WheelKind::Hours12 => 12,
            WheelKind::Range { max } => max,
        }
    }

    /// length of the base range
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.high() - self.low()) as usize + 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// number of rendered rows
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.len() * COPIES
    }

    pub fn values(&self) -> impl Iterator<Item = u8> {
        self.low()..=self.high()
    }

    /// position of `value` in the base range
    #[must_use]
    pub fn position(&self, value: u8) -> Option<usize> {
        (self.low()..=self.high())
            .contains(&value)
            .then(|| usize::from(value - self.low()))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    #[must_use]
    pub fn value_at_row(&self, row: i64) -> u8 {
        let len = self.len() as i64;
        // rem_euclid keeps negative rows inside the range as well
        self.low() + row.rem_euclid(len) as u8
    }

    /// two digit label of a rendered row
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn label(&self, row: usize) -> String {
        format_value(self.value_at_row(row as i64))
    }

    /// Every row showing the same text as `value` is highlighted, not only the
    /// physical row under the selection band.
    #[must_use]
    pub fn is_selected(&self, row: usize, value: u8) -> bool {
        self.label(row) == format_value(value)
    }

    #[allow(clippy::cast_precision_loss)]
    fn copy_height(&self) -> f32 {
        self.len() as f32 * ROW_HEIGHT
    }

    /// Offset that puts `value` under the selection band in the middle copy.
    /// Values outside the range start at the first row of the middle copy.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn initial_offset(&self, value: u8) -> f32 {
        let row = self.len() + self.position(value).unwrap_or(0);
        row as f32 * ROW_HEIGHT
    }

    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn index_at(&self, offset: f32) -> i64 {
        (offset / ROW_HEIGHT).round() as i64
    }

    #[must_use]
    pub fn value_at(&self, offset: f32) -> u8 {
        self.value_at_row(self.index_at(offset))
    }

    /// The equivalent offset inside the middle copy, or `None` when `offset`
    /// already rounds to a row of the middle copy.
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    #[must_use]
    pub fn recenter(&self, offset: f32) -> Option<f32> {
        let len = self.len() as i64;
        let index = self.index_at(offset);
        if (len..2 * len).contains(&index) {
            return None;
        }
        let copies = index.div_euclid(len) - 1;
        Some((copies as f32).mul_add(-self.copy_height(), offset))
    }

    /// Commits the value under `offset` and returns the resting offset, which
    /// is snapped to the row and re-centred.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn settle(&self, offset: f32) -> Settle {
        let offset = self.recenter(offset).unwrap_or(offset);
        let index = self.index_at(offset);
        Settle {
            value: self.value_at_row(index),
            offset: index as f32 * ROW_HEIGHT,
        }
    }
}

#[must_use]
pub fn format_value(value: u8) -> String {
    format!("{value:02}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// at rest, value stable
    #[default]
    Idle,
    /// user driven, value provisional
    Scrolling,
}

/// Per-screen state of one wheel: the committed value plus the phase of the
/// scroll gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelState {
    wheel: Wheel,
    value: u8,
    phase: Phase,
    last_offset: f32,
    scroll_to: Option<f32>,
}

impl WheelState {
    /// The initial offset is requested straight away so the first frame
    /// already shows `value` in the middle copy.
    #[must_use]
    pub fn new(wheel: Wheel, value: u8) -> Self {
        let value = if wheel.position(value).is_some() {
            value
        } else {
            wheel.value_at_row(0)
        };
        let offset = wheel.initial_offset(value);
        Self {
            wheel,
            value,
            phase: Phase::Idle,
            last_offset: offset,
            scroll_to: Some(offset),
        }
    }

    #[must_use]
    pub const fn wheel(&self) -> &Wheel {
        &self.wheel
    }

    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Programmatic scroll to apply on the next frame, without animation.
    pub fn take_scroll_request(&mut self) -> Option<f32> {
        self.scroll_to.take()
    }

    /// Feeds the offset seen this frame. While the offset keeps moving or the
    /// pointer is held the wheel is scrolling; the first quiet frame after
    /// that commits the value and re-centres. Returns the new value if it
    /// changed.
    pub fn observe(&mut self, offset: f32, dragging: bool) -> Option<u8> {
        let moved = (offset - self.last_offset).abs() > OFFSET_EPSILON;
        self.last_offset = offset;
        if moved || dragging {
            self.phase = Phase::Scrolling;
            return None;
        }
        if self.phase == Phase::Idle {
            return None;
        }
        self.phase = Phase::Idle;

        let settle = self.wheel.settle(offset);
        if (settle.offset - offset).abs() > OFFSET_EPSILON {
            log::trace!("wheel repositioned from {offset} to {}", settle.offset);
            self.scroll_to = Some(settle.offset);
            self.last_offset = settle.offset;
        }
        if settle.value == self.value {
            None
        } else {
            self.value = settle.value;
            Some(settle.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> f32 {
        n as f32 * ROW_HEIGHT
    }

    #[test]
    fn base_ranges() {
        assert_eq!(Wheel::hours().values().collect::<Vec<_>>(), (1..=12).collect::<Vec<_>>());
        assert_eq!(Wheel::minutes().len(), 60);
        assert_eq!(Wheel::range(23).len(), 24);
        assert_eq!(Wheel::minutes().row_count(), 180);
    }

    #[test]
    fn values_repeat_every_copy() {
        for wheel in [Wheel::hours(), Wheel::minutes(), Wheel::range(23)] {
            let len = wheel.len();
            for row in 0..wheel.row_count() - len {
                assert_eq!(
                    wheel.value_at(rows(row)),
                    wheel.value_at(rows(row + len)),
                    "{wheel:?} row {row}"
                );
            }
        }
    }

    #[test]
    fn negative_rows_wrap() {
        let wheel = Wheel::minutes();
        assert_eq!(wheel.value_at_row(-1), 59);
        assert_eq!(wheel.value_at_row(-60), 0);
        assert_eq!(Wheel::hours().value_at_row(-1), 12);
    }

    #[test]
    fn hour_wheel_wraps_twelve_to_one() {
        let wheel = Wheel::hours();
        assert_eq!(wheel.value_at_row(11), 12);
        assert_eq!(wheel.value_at_row(12), 1);
        assert_eq!(wheel.initial_offset(12), rows(23));
    }

    #[test]
    fn index_rounds_to_nearest_row() {
        let wheel = Wheel::minutes();
        assert_eq!(wheel.index_at(rows(63) + 24.0), 63);
        assert_eq!(wheel.index_at(rows(63) + 26.0), 64);
    }

    #[test]
    fn recenter_is_idempotent_in_middle_copy() {
        let wheel = Wheel::minutes();
        for row in 60..120 {
            assert_eq!(wheel.recenter(rows(row)), None);
        }
        let moved = wheel.recenter(rows(5)).unwrap();
        assert_eq!(moved, rows(65));
        assert_eq!(wheel.recenter(moved), None);
    }

    #[test]
    fn recenter_from_last_copy() {
        let wheel = Wheel::hours();
        assert_eq!(wheel.recenter(rows(30)), Some(rows(18)));
        // the part of a row past the snap point is kept
        assert_eq!(wheel.recenter(rows(30) + 10.0), Some(rows(18) + 10.0));
    }

    #[test]
    fn minute_wheel_initial_offset() {
        assert_eq!(Wheel::minutes().initial_offset(45), rows(60 + 45));
    }

    #[test]
    fn settle_in_middle_copy_keeps_offset() {
        let wheel = Wheel::minutes();
        let settle = wheel.settle(rows(63));
        assert_eq!(settle.value, 3);
        assert_eq!(settle.offset, rows(63));
    }

    #[test]
    fn settle_in_first_copy_moves_to_middle() {
        let wheel = Wheel::minutes();
        let settle = wheel.settle(rows(5));
        assert_eq!(settle.value, 5);
        assert_eq!(settle.offset, rows(65));
    }

    #[test]
    fn selection_matches_every_copy() {
        let wheel = Wheel::minutes();
        let selected: Vec<usize> = (0..wheel.row_count())
            .filter(|row| wheel.is_selected(*row, 7))
            .collect();
        assert_eq!(selected, vec![7, 67, 127]);
        assert_eq!(wheel.label(67), "07");
    }

    #[test]
    fn state_requests_initial_offset() {
        let mut state = WheelState::new(Wheel::minutes(), 45);
        assert_eq!(state.take_scroll_request(), Some(rows(105)));
        assert_eq!(state.take_scroll_request(), None);
        assert_eq!(state.value(), 45);
    }

    #[test]
    fn state_out_of_range_value_falls_back() {
        let state = WheelState::new(Wheel::hours(), 0);
        assert_eq!(state.value(), 1);
    }

    #[test]
    fn state_commits_only_once_scrolling_stops() {
        let mut state = WheelState::new(Wheel::minutes(), 45);
        state.take_scroll_request();

        // dragging keeps the value provisional
        assert_eq!(state.observe(rows(70), true), None);
        assert_eq!(state.observe(rows(63), false), None);
        assert_eq!(state.phase(), Phase::Scrolling);

        // quiet frame
        assert_eq!(state.observe(rows(63), false), Some(3));
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.take_scroll_request(), None);

        // nothing more happens while at rest
        assert_eq!(state.observe(rows(63), false), None);
        assert_eq!(state.take_scroll_request(), None);
    }

    #[test]
    fn state_recenters_after_settling_in_first_copy() {
        let mut state = WheelState::new(Wheel::minutes(), 45);
        state.take_scroll_request();

        state.observe(rows(5), false);
        assert_eq!(state.observe(rows(5), false), Some(5));
        assert_eq!(state.take_scroll_request(), Some(rows(65)));

        // the jump itself is not a new scroll gesture
        assert_eq!(state.observe(rows(65), false), None);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.value(), 5);
    }

    #[test]
    fn state_snaps_between_rows() {
        let mut state = WheelState::new(Wheel::hours(), 1);
        state.take_scroll_request();

        state.observe(rows(14) + 12.0, false);
        assert_eq!(state.observe(rows(14) + 12.0, false), Some(3));
        assert_eq!(state.take_scroll_request(), Some(rows(14)));
    }
}

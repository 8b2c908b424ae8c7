use eframe::egui::{
    self, scroll_area::ScrollBarVisibility, Label, RichText, ScrollArea, Stroke, Widget,
};

use crate::wheel::{Phase, WheelState, ROW_HEIGHT, VISIBLE_ROWS};

const WHEEL_WIDTH: f32 = 70.0;
const TEXT_SIZE: f32 = 20.0;
const SELECTED_TEXT_SIZE: f32 = 24.0;

/// Looping number picker drawn over a [`WheelState`].
///
/// Reports `changed()` on the frame a new value is committed, which is only
/// once scrolling has come to rest.
pub struct TimeWheel<'a> {
    state: &'a mut WheelState,
    id_salt: &'a str,
}

impl<'a> TimeWheel<'a> {
    pub fn new(state: &'a mut WheelState, id_salt: &'a str) -> Self {
        Self { state, id_salt }
    }
}

impl Widget for TimeWheel<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let Self { state, id_salt } = self;
        // selected numbers and the band follow the theme
        let accent = ui.visuals().selection.stroke.color;
        let height = ROW_HEIGHT * VISIBLE_ROWS as f32;
        // rows above and below the content so the first and last row can
        // still reach the selection band
        let padding = ROW_HEIGHT * (VISIBLE_ROWS / 2) as f32;

        let mut inner = ui.vertical(|ui| {
            ui.set_width(WHEEL_WIDTH);
            let mut area = ScrollArea::vertical()
                .id_salt(id_salt)
                .max_height(height)
                .min_scrolled_height(height)
                .scroll_bar_visibility(ScrollBarVisibility::AlwaysHidden);
            if let Some(offset) = state.take_scroll_request() {
                area = area.vertical_scroll_offset(offset);
            }

            let wheel = *state.wheel();
            let value = state.value();
            let output = area.show(ui, |ui| {
                ui.spacing_mut().item_spacing.y = 0.0;
                ui.add_space(padding);
                for row in 0..wheel.row_count() {
                    let text = RichText::new(wheel.label(row));
                    let text = if wheel.is_selected(row, value) {
                        text.size(SELECTED_TEXT_SIZE).strong().color(accent)
                    } else {
                        text.size(TEXT_SIZE).weak()
                    };
                    ui.add_sized([WHEEL_WIDTH, ROW_HEIGHT], Label::new(text).selectable(false));
                }
                ui.add_space(padding);
            });

            // selection band across the middle row
            let center = output.inner_rect.center();
            let band = egui::Rect::from_center_size(
                center,
                egui::vec2(output.inner_rect.width(), ROW_HEIGHT),
            );
            ui.painter().rect_stroke(
                band,
                4.0,
                Stroke::new(1.0, accent),
                egui::StrokeKind::Inside,
            );

            let press_origin = ui.input(|i| i.pointer.press_origin());
            let dragging = pressed_inside(output.inner_rect, press_origin);
            state.observe(output.state.offset.y, dragging)
        });

        if inner.inner.is_some() {
            inner.response.mark_changed();
        }
        if state.phase() == Phase::Scrolling {
            // keep frames coming so the end of the scroll is noticed
            ui.ctx().request_repaint();
        }
        inner.response
    }
}

/// A press that started on the wheel holds it for as long as the button is
/// down, even once the pointer has left the wheel.
fn pressed_inside(rect: egui::Rect, press_origin: Option<egui::Pos2>) -> bool {
    press_origin.is_some_and(|origin| rect.contains(origin))
}

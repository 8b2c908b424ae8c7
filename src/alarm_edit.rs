use std::path::{Path, PathBuf};

use chrono::Weekday;
use eframe::egui::{self, Button, ScrollArea, Window};
use log::error;

use crate::{
    alarm::{AlarmRecord, AlarmTime, SavedSound},
    audio::Preview,
    error::{Error, Result},
    recording::Recorder,
    sounds,
    storage::SoundLibrary,
    wheel::{Wheel, WheelState},
    widgets::TimeWheel,
    AlarmBuilder, Alert, TimeOfDay,
};

/// weekday buttons, in the order they are shown
const DAY_BUTTONS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl AlarmBuilder {
    /// The wheel shows 1..=12, the alarm needs 0..=23. Recomputed from the
    /// wheel value and the AM/PM toggle on every call so the two can change
    /// independently.
    #[must_use]
    pub const fn hour_24(&self) -> u8 {
        self.time_of_day.to_24_hour(self.hour)
    }

    #[must_use]
    pub const fn sound(&self) -> Option<&PathBuf> {
        self.sound.as_ref()
    }

    pub fn set_sound(&mut self, sound: Option<PathBuf>) {
        self.sound = sound;
    }

    pub fn toggle_day(&mut self, day: Weekday) {
        self.repeat_days.toggle(day);
    }

    /// # Errors
    /// [`Error::NoSoundSelected`] until a sound is attached
    pub fn build(&self) -> Result<AlarmRecord> {
        let sound = self.sound.clone().ok_or(Error::NoSoundSelected)?;
        let time = AlarmTime::new(self.hour_24(), self.minute).ok_or(Error::InvalidTime {
            hour: self.hour_24(),
            minute: self.minute,
        })?;
        Ok(AlarmRecord::new(time, sound, self.repeat_days))
    }
}

pub enum EditingState {
    Cancelled,
    Editing,
    Done(AlarmRecord),
}

/// What the editor needs from the rest of the app while it is open.
pub struct EditorContext<'a> {
    pub sounds_dir: &'a Path,
    pub library: &'a SoundLibrary,
    pub saved_sounds: &'a mut Vec<SavedSound>,
    pub alert: &'a mut Option<Alert>,
}

/// The alarm creation screen. Owns its wheels and audio handles; closing the
/// screen drops them, which stops any preview or recording.
pub struct AlarmEditor {
    builder: AlarmBuilder,
    hour_wheel: WheelState,
    minute_wheel: WheelState,
    preview: Preview,
    recorder: Recorder,
    recording_name: String,
}

impl Default for AlarmEditor {
    fn default() -> Self {
        Self::new(AlarmBuilder::default())
    }
}

impl AlarmEditor {
    #[must_use]
    pub fn new(builder: AlarmBuilder) -> Self {
        Self {
            hour_wheel: WheelState::new(Wheel::hours(), builder.hour),
            minute_wheel: WheelState::new(Wheel::minutes(), builder.minute),
            builder,
            preview: Preview::new(),
            recorder: Recorder::new(),
            recording_name: String::new(),
        }
    }

    #[must_use]
    pub const fn builder(&self) -> &AlarmBuilder {
        &self.builder
    }

    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Copies an uploaded file into the sounds directory and selects it.
    ///
    /// # Errors
    /// if the copy fails
    pub fn upload_sound(&mut self, src: &Path, sounds_dir: &Path) -> Result<PathBuf> {
        self.preview.stop();
        let path = sounds::import_upload(src, sounds_dir)?;
        self.builder.set_sound(Some(path.clone()));
        Ok(path)
    }

    /// Starts recording, or stops and selects the recording. A named
    /// recording is also added to the sound library and returned.
    ///
    /// # Errors
    /// if the microphone is unavailable or the recording can't be saved
    pub fn toggle_recording(
        &mut self,
        sounds_dir: &Path,
        library: &SoundLibrary,
    ) -> Result<Option<SavedSound>> {
        if !self.recorder.is_recording() {
            self.preview.stop();
            self.recorder.start()?;
            return Ok(None);
        }
        let name = self.recording_name.trim().to_string();
        let label = (!name.is_empty()).then_some(name.as_str());
        let path = self.recorder.stop(sounds_dir, label)?;
        self.builder.set_sound(Some(path.clone()));
        if name.is_empty() {
            return Ok(None);
        }
        let saved = SavedSound { name, uri: path };
        library.add(saved.clone())?;
        self.recording_name.clear();
        Ok(Some(saved))
    }

    /// # Errors
    /// if the selected sound can't be played
    pub fn toggle_preview(&mut self) -> Result<()> {
        if self.preview.is_playing() {
            self.preview.stop();
        } else if let Some(sound) = self.builder.sound() {
            self.preview.play(sound)?;
        }
        Ok(())
    }

    pub fn clear_sound(&mut self) {
        self.preview.stop();
        self.builder.set_sound(None);
    }

    fn render_time_editor(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add(TimeWheel::new(&mut self.hour_wheel, "hour_wheel"));
            ui.label(egui::RichText::new(":").size(24.0));
            ui.add(TimeWheel::new(&mut self.minute_wheel, "minute_wheel"));
            self.render_am_pm_selector(ui);
        });
        // the wheels commit on settle, the builder follows
        self.builder.hour = self.hour_wheel.value();
        self.builder.minute = self.minute_wheel.value();
    }

    fn render_am_pm_selector(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.add_space(15.0);
            ui.selectable_value(&mut self.builder.time_of_day, TimeOfDay::AM, "AM");
            ui.selectable_value(&mut self.builder.time_of_day, TimeOfDay::PM, "PM");
        });
    }

    fn render_repeat_editor(&mut self, ui: &mut egui::Ui) {
        ui.label("Repeat");
        ui.horizontal(|ui| {
            for day in DAY_BUTTONS {
                let selected = self.builder.repeat_days.contains(day);
                if ui.selectable_label(selected, day.to_string()).clicked() {
                    self.builder.toggle_day(day);
                }
            }
        });
    }

    fn render_sound_editor(&mut self, ui: &mut egui::Ui, cx: &mut EditorContext<'_>) {
        ui.label("Alarm Sound");
        if let Some(sound) = self.builder.sound().cloned() {
            ui.horizontal(|ui| {
                let name = sound
                    .file_name()
                    .map_or_else(|| sound.to_string_lossy(), |name| name.to_string_lossy())
                    .into_owned();
                ui.label(name);
                let play = if self.preview.is_playing() { "⏹" } else { "▶" };
                if ui.button(play).on_hover_text("preview").clicked() {
                    if let Err(e) = self.toggle_preview() {
                        error!("Error playing sound: {e}");
                        *cx.alert = Some(Alert::error("Failed to play sound"));
                    }
                }
                if ui.button("x").on_hover_text("remove sound").clicked() {
                    self.clear_sound();
                }
            });
            if self.preview.is_playing() {
                // notice when playback ends
                ui.ctx()
                    .request_repaint_after(std::time::Duration::from_millis(250));
            }
            return;
        }

        ui.horizontal(|ui| {
            if ui.button("Upload Sound").clicked() {
                self.preview.stop();
                // cancelling the dialog is not an error
                if let Some(src) = sounds::pick_audio_file() {
                    *cx.alert = Some(match self.upload_sound(&src, cx.sounds_dir) {
                        Ok(_) => Alert::success("Audio file uploaded successfully!"),
                        Err(e) => {
                            error!("Error uploading file: {e}");
                            Alert::error("Failed to upload audio file")
                        }
                    });
                }
            }
            let record = if self.is_recording() {
                "Stop Recording"
            } else {
                "Record Sound"
            };
            if ui.button(record).clicked() {
                let was_recording = self.is_recording();
                match self.toggle_recording(cx.sounds_dir, cx.library) {
                    Ok(saved) => {
                        if let Some(saved) = saved {
                            cx.saved_sounds.push(saved);
                        }
                        if was_recording {
                            *cx.alert = Some(Alert::success("Recording saved successfully!"));
                        }
                    }
                    Err(e) => {
                        error!("Error with recording: {e}");
                        *cx.alert = Some(Alert::from_error(&e, "Failed to record audio"));
                    }
                }
            }
        });
        if self.is_recording() {
            ui.ctx().request_repaint();
        }
        ui.horizontal(|ui| {
            ui.label("name");
            ui.text_edit_singleline(&mut self.recording_name)
                .on_hover_text("optional, saves the recording to your sounds");
        });

        if !cx.saved_sounds.is_empty() {
            ui.label("Saved sounds");
            ScrollArea::vertical()
                .id_salt("saved_sounds")
                .max_height(100.0)
                .show(ui, |ui| {
                    for saved in cx.saved_sounds.iter() {
                        if ui.selectable_label(false, saved.name.as_str()).clicked() {
                            self.builder.set_sound(Some(saved.uri.clone()));
                        }
                    }
                });
        }
    }

    pub fn render_alarm_editor(
        &mut self,
        ctx: &egui::Context,
        cx: &mut EditorContext<'_>,
    ) -> EditingState {
        let mut ret = EditingState::Editing;
        Window::new("Set New Alarm")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                self.render_time_editor(ui);
                ui.separator();
                self.render_repeat_editor(ui);
                ui.separator();
                self.render_sound_editor(ui, cx);
                ui.separator();
                ui.horizontal(|ui| {
                    // no saving until there is a sound
                    let save = ui.add_enabled(self.builder.sound().is_some(), Button::new("save"));
                    if save.clicked() {
                        match self.builder.build() {
                            Ok(alarm) => ret = EditingState::Done(alarm),
                            Err(e) => *cx.alert = Some(Alert::error(e.to_string())),
                        }
                    } else if ui.button("cancel").clicked() {
                        ret = EditingState::Cancelled;
                    }
                });
            });
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(hour: u8, minute: u8, time_of_day: TimeOfDay) -> AlarmBuilder {
        AlarmBuilder {
            hour,
            minute,
            time_of_day,
            ..AlarmBuilder::default()
        }
    }

    #[test]
    fn save_needs_a_sound() {
        let builder = builder(7, 30, TimeOfDay::AM);
        assert!(matches!(builder.build(), Err(Error::NoSoundSelected)));
    }

    #[test]
    fn build_applies_am_pm() {
        let mut builder = builder(12, 15, TimeOfDay::AM);
        builder.set_sound(Some(PathBuf::from("wake.wav")));
        let alarm = builder.build().unwrap();
        assert_eq!((alarm.time.hour(), alarm.time.minute()), (0, 15));
        assert!(alarm.enabled);

        // toggling the period after picking the hour is picked up
        builder.time_of_day = TimeOfDay::PM;
        assert_eq!(builder.build().unwrap().time.hour(), 12);
        builder.hour = 3;
        assert_eq!(builder.build().unwrap().time.hour(), 15);
    }

    #[test]
    fn repeat_days_toggle() {
        let mut builder = builder(7, 0, TimeOfDay::AM);
        builder.set_sound(Some(PathBuf::from("wake.wav")));
        builder.toggle_day(Weekday::Mon);
        builder.toggle_day(Weekday::Sun);
        builder.toggle_day(Weekday::Mon);
        let alarm = builder.build().unwrap();
        assert_eq!(alarm.repeat_days.iter().collect::<Vec<_>>(), vec![Weekday::Sun]);
    }

    #[test]
    fn editor_starts_wheels_on_builder_time() {
        let editor = AlarmEditor::new(builder(9, 41, TimeOfDay::PM));
        assert_eq!(editor.hour_wheel.value(), 9);
        assert_eq!(editor.minute_wheel.value(), 41);
        assert_eq!(editor.builder().hour_24(), 21);
    }

    #[test]
    fn upload_selects_copied_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("rooster.mp3");
        std::fs::write(&src, b"cock-a-doodle-doo").unwrap();
        let sounds_dir = dir.path().join("sounds");

        let mut editor = AlarmEditor::new(builder(6, 0, TimeOfDay::AM));
        let path = editor.upload_sound(&src, &sounds_dir).unwrap();
        assert_eq!(path, sounds_dir.join("rooster.mp3"));
        assert_eq!(editor.builder().sound(), Some(&path));

        editor.clear_sound();
        assert_eq!(editor.builder().sound(), None);
    }

    #[test]
    fn preview_without_sound_does_nothing() {
        let mut editor = AlarmEditor::default();
        editor.toggle_preview().unwrap();
        assert!(!editor.is_recording());
        assert_eq!(editor.builder().sound(), None);
    }
}

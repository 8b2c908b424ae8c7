#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::path::PathBuf;

use alarm::{AlarmId, AlarmRecord, RepeatDays, SavedSound};
use alarm_edit::{AlarmEditor, EditingState, EditorContext};
use chrono::Timelike;
use communication::Event;
use config::{Config, Theme};
use eframe::egui::{self, Button, CentralPanel, Context, Grid, Layout, ScrollArea, TopBottomPanel, Window};
use log::{error, info, warn};
use schedule::Scheduler;
use storage::{AlarmStore, SoundLibrary};

pub mod alarm;
/// implementation of alarm editing for egui
pub mod alarm_edit;
pub mod audio;
pub mod communication;
pub mod config;
pub mod error;
pub mod recording;
pub mod schedule;
pub mod sounds;
pub mod storage;
pub mod wheel;
pub mod widgets;

pub use error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOfDay {
    #[default]
    AM,
    PM,
}

impl TimeOfDay {
    /// `12 AM` is midnight and `12 PM` is noon.
    #[must_use]
    pub const fn to_24_hour(self, hour12: u8) -> u8 {
        match (self, hour12) {
            (Self::AM, 12) => 0,
            (Self::PM, 12) => 12,
            (Self::AM, hour) => hour,
            (Self::PM, hour) => hour + 12,
        }
    }

    /// Splits a 0..=23 hour into the wheel value and the period.
    #[must_use]
    pub const fn from_24_hour(hour: u8) -> (u8, Self) {
        let period = if hour < 12 { Self::AM } else { Self::PM };
        match hour % 12 {
            0 => (12, period),
            hour => (hour, period),
        }
    }

    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::AM => Self::PM,
            Self::PM => Self::AM,
        }
    }
}

/// two digit label of a 12 hour clock hour
#[must_use]
pub fn format_hour(hour12: u8) -> String {
    wheel::format_value(hour12)
}

/// State of the alarm creation form. The hour is what the wheel shows
/// (1..=12), the period comes from the AM/PM toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmBuilder {
    hour: u8,
    minute: u8,
    time_of_day: TimeOfDay,
    sound: Option<PathBuf>,
    repeat_days: RepeatDays,
}

impl Default for AlarmBuilder {
    #[allow(clippy::cast_possible_truncation)]
    fn default() -> Self {
        let time = chrono::Local::now().naive_local().time();
        let (pm, hour) = time.hour12();
        Self {
            hour: hour as u8,
            minute: time.minute() as u8,
            time_of_day: if pm { TimeOfDay::PM } else { TimeOfDay::AM },
            sound: None,
            repeat_days: RepeatDays::new(),
        }
    }
}

/// One-shot message box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("Success", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// Microphone refusals get their own alert, anything else the generic
    /// `message`.
    pub fn from_error(err: &Error, message: impl Into<String>) -> Self {
        if err.is_permission_denied() {
            Self::new("Permission required", "Please grant microphone permission")
        } else {
            Self::error(message)
        }
    }
}

/// an alarm that went off and hasn't been stopped yet
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ringing {
    id: AlarmId,
    title: String,
    body: String,
}

pub struct Clock {
    config: Config,
    config_path: Option<PathBuf>,
    store: AlarmStore,
    library: SoundLibrary,
    sounds_dir: PathBuf,
    alarms: Vec<AlarmRecord>,
    saved_sounds: Vec<SavedSound>,
    scheduler: Scheduler,
    in_config: bool,
    adding_alarm: Option<AlarmEditor>,
    ringing: Vec<Ringing>,
    alert: Option<Alert>,
}

impl Clock {
    /// Loads both lists and hands every enabled alarm to the scheduler. A
    /// list that can't be read starts out empty with an alert, the stored
    /// file is left alone until the user changes something.
    ///
    /// # Errors
    /// if the data directory can't be resolved
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        let storage = storage::KeyValueStore::new(config.data_path()?);
        let sounds_dir = config.sounds_path()?;
        let store = AlarmStore::new(storage.clone());
        let library = SoundLibrary::new(storage);
        let mut alert = None;
        let alarms = store.list().unwrap_or_else(|e| {
            error!("Error loading alarms: {e}");
            alert = Some(Alert::error("Failed to load alarms"));
            Vec::new()
        });
        let saved_sounds = library.list().unwrap_or_else(|e| {
            error!("Error loading saved sounds: {e}");
            alert = Some(Alert::error("Failed to load saved sounds"));
            Vec::new()
        });
        let scheduler = Scheduler::spawn(config.tick());

        for alarm in alarms.iter().filter(|alarm| alarm.enabled) {
            scheduler.schedule_alarm(alarm)?;
        }
        info!(
            "loaded {} alarms and {} saved sounds",
            alarms.len(),
            saved_sounds.len()
        );

        Ok(Self {
            config,
            config_path,
            store,
            library,
            sounds_dir,
            alarms,
            saved_sounds,
            scheduler,
            in_config: false,
            adding_alarm: None,
            ringing: Vec::new(),
            alert,
        })
    }

    fn add_alarm(&mut self, alarm: AlarmRecord) -> Result<()> {
        self.scheduler.schedule_alarm(&alarm)?;
        self.alarms = self.store.add(alarm)?;
        Ok(())
    }

    fn toggle_alarm(&mut self, id: &AlarmId) -> Result<()> {
        self.alarms = self.store.toggle(id)?;
        if let Some(alarm) = self.alarms.iter().find(|alarm| &alarm.id == id) {
            if alarm.enabled {
                self.scheduler.schedule_alarm(alarm)?;
            } else {
                self.scheduler.cancel(id.clone())?;
            }
        }
        Ok(())
    }

    fn delete_alarm(&mut self, id: &AlarmId) -> Result<()> {
        self.alarms = self.store.delete(id)?;
        self.scheduler.cancel(id.clone())?;
        self.ringing.retain(|ringing| &ringing.id != id);
        Ok(())
    }

    fn save_config(&self) {
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save(path) {
                error!("couldn't save config: {e}");
            }
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let mut changed = false;
        Window::new("settings ⚙")
            .open(&mut self.in_config)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("time format");
                    changed |= ui
                        .text_edit_singleline(&mut self.config.time_format)
                        .lost_focus();
                });
                ui.label(format!("sounds are kept in {}", self.sounds_dir.display()));
            });
        if changed {
            self.save_config();
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("time_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme_btn = ui.add(Button::new({
                    if self.config.theme == Theme::Dark {
                        "🌞"
                    } else {
                        "🌙"
                    }
                }));
                if theme_btn.clicked() {
                    self.config.theme = !self.config.theme;
                    self.save_config();
                }
                // TODO: fix allignment
                ui.centered_and_justified(|ui| {
                    ui.label(format!(
                        "Time: {}",
                        alarm::format_time(
                            chrono::Local::now().naive_local().time(),
                            &self.config.time_format
                        )
                    ));
                });
                ui.with_layout(Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("⚙").on_hover_text("settings").clicked() {
                        self.in_config = true;
                    }
                });
            });
        });
    }

    fn list_alarms(&mut self, ui: &mut egui::Ui) {
        // changes are applied after the loop, the list is rewritten by them
        let mut toggled = None;
        let mut deleted = None;
        for alarm in &self.alarms {
            ui.scope(|ui| {
                // gray out if alarm is disabled
                if !alarm.enabled {
                    ui.disable();
                }
                ui.label(alarm.time.format(&self.config.time_format));
                ui.label(alarm.repeat_days.to_string());
                ui.label(alarm.sound_name());
            });
            let mut enabled = alarm.enabled;
            if ui.checkbox(&mut enabled, "enabled").changed() {
                toggled = Some(alarm.id.clone());
            }
            if ui.button("x").on_hover_text("delete alarm").clicked() {
                deleted = Some(alarm.id.clone());
            }
            ui.end_row();
        }

        if let Some(id) = toggled {
            if let Err(e) = self.toggle_alarm(&id) {
                error!("Error toggling alarm: {e}");
                self.alert = Some(Alert::error("Failed to update alarm"));
            }
        }
        if let Some(id) = deleted {
            if let Err(e) = self.delete_alarm(&id) {
                error!("Error deleting alarm: {e}");
                self.alert = Some(Alert::error("Failed to delete alarm"));
            }
        }
    }

    fn render_ringing(&mut self, ctx: &Context) {
        let mut stopped = None;
        for ringing in &self.ringing {
            Window::new(format!("{} {}", ringing.title, ringing.id))
                .title_bar(false)
                .collapsible(false)
                .auto_sized()
                .show(ctx, |ui| {
                    ui.heading(ringing.title.as_str());
                    ui.label(ringing.body.as_str());
                    if ui.button("stop").clicked() {
                        stopped = Some(ringing.id.clone());
                    }
                });
        }
        if let Some(id) = stopped {
            self.ringing.retain(|ringing| ringing.id != id);
            if let Err(e) = self.scheduler.stop(id) {
                error!("couldn't stop alarm: {e}");
            }
        }
    }

    fn render_alert(&mut self, ctx: &Context) {
        let mut dismissed = false;
        if let Some(alert) = &self.alert {
            Window::new(alert.title.as_str())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(alert.message.as_str());
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
        }
        if dismissed {
            self.alert = None;
        }
    }

    fn poll_scheduler(&mut self) {
        let events: Vec<Event> = self.scheduler.events().collect();
        for event in events {
            match event {
                Event::Ringing { id, title, body } => {
                    info!("alarm {id} went off");
                    self.ringing.push(Ringing { id, title, body });
                }
                Event::Failed { id, reason } => {
                    warn!("alarm {id} couldn't ring: {reason}");
                    self.alert = Some(Alert::error(format!(
                        "Alarm {id} went off but its sound couldn't be played"
                    )));
                }
            }
        }
    }
}

impl eframe::App for Clock {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // the scheduler runs on its own thread, wake up to hear from it
        ctx.request_repaint_after(self.config.tick());
        self.poll_scheduler();

        ctx.set_visuals(self.config.theme.into());
        // config window
        if self.in_config {
            self.render_settings(ctx);
        }
        // alarm creation
        if let Some(editing) = &mut self.adding_alarm {
            let mut cx = EditorContext {
                sounds_dir: &self.sounds_dir,
                library: &self.library,
                saved_sounds: &mut self.saved_sounds,
                alert: &mut self.alert,
            };
            match editing.render_alarm_editor(ctx, &mut cx) {
                EditingState::Done(new_alarm) => {
                    self.adding_alarm = None;
                    self.alert = Some(match self.add_alarm(new_alarm) {
                        Ok(()) => Alert::success("Alarm saved!"),
                        Err(e) => {
                            error!("Error saving alarm: {e}");
                            Alert::error("Failed to save alarm")
                        }
                    });
                }
                EditingState::Cancelled => {
                    self.adding_alarm = None;
                }
                EditingState::Editing => {}
            }
        }
        // header
        self.render_header(ctx);
        // show all alarms
        CentralPanel::default().show(ctx, |ui| {
            if ui.button("+").on_hover_text("add alarm").clicked() && self.adding_alarm.is_none()
            {
                self.adding_alarm = Some(AlarmEditor::default());
            }

            if self.alarms.is_empty() {
                ui.label("No alarms set");
            }
            ScrollArea::vertical().show(ui, |ui| {
                Grid::new("alarms").show(ui, |ui| {
                    self.list_alarms(ui);
                });
            });
        });
        self.render_ringing(ctx);
        self.render_alert(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hour_boundaries() {
        assert_eq!(TimeOfDay::AM.to_24_hour(12), 0);
        assert_eq!(TimeOfDay::PM.to_24_hour(12), 12);
        assert_eq!(TimeOfDay::AM.to_24_hour(1), 1);
        assert_eq!(TimeOfDay::PM.to_24_hour(1), 13);
        assert_eq!(TimeOfDay::PM.to_24_hour(11), 23);
    }

    #[test]
    fn every_hour_round_trips() {
        for hour in 0..24 {
            let (hour12, period) = TimeOfDay::from_24_hour(hour);
            assert!((1..=12).contains(&hour12));
            assert_eq!(period.to_24_hour(hour12), hour, "{hour12} {period:?}");
        }
        assert_eq!(TimeOfDay::from_24_hour(0), (12, TimeOfDay::AM));
        assert_eq!(TimeOfDay::from_24_hour(12), (12, TimeOfDay::PM));
        assert_eq!(format_hour(TimeOfDay::from_24_hour(0).0), "12");
    }

    #[test]
    fn toggle_period() {
        assert_eq!(TimeOfDay::AM.toggle(), TimeOfDay::PM);
        assert_eq!(TimeOfDay::PM.toggle().toggle(), TimeOfDay::PM);
    }

    #[test]
    fn default_builder_is_a_valid_wheel_time() {
        let builder = AlarmBuilder::default();
        assert!((1..=12).contains(&builder.hour));
        assert!(builder.minute < 60);
        assert!(builder.hour_24() < 24);
        assert_eq!(builder.sound, None);
    }

    #[test]
    fn permission_alert() {
        let err = Error::Audio(error::AudioError::PermissionDenied("denied".into()));
        let alert = Alert::from_error(&err, "Failed to record audio");
        assert_eq!(alert.title, "Permission required");

        let alert = Alert::from_error(&Error::NoSoundSelected, "Failed to record audio");
        assert_eq!(alert, Alert::error("Failed to record audio"));
    }

    #[test]
    fn unreadable_alarm_list_opens_empty_with_alert() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("alarms.json");
        std::fs::write(&blob, "{ not json").unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };

        let clock = Clock::new(config, None).unwrap();
        assert!(clock.alarms.is_empty());
        assert!(clock.saved_sounds.is_empty());
        assert_eq!(clock.alert, Some(Alert::error("Failed to load alarms")));
        // nothing is rewritten until the user changes something
        assert_eq!(std::fs::read_to_string(&blob).unwrap(), "{ not json");
    }
}

//! Turning alarms into notifications and firing them on time.
//!
//! [`Agenda`] is the pure bookkeeping: which notification is due next and
//! what happens to it after it fires. [`Scheduler`] runs an agenda on a
//! background thread, rings due alarms through [`Ringer`] and reports back to
//! the GUI over a channel.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::Duration,
};

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime};
use log::{debug, error, info};

use crate::{
    alarm::{AlarmId, AlarmRecord, RepeatDays},
    audio::Ringer,
    communication::{Event, Message},
    error::{Error, Result},
};

pub const TITLE: &str = "Alarm";
pub const BODY: &str = "Your alarm is ringing!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// fires once at an absolute local date-time
    Once(NaiveDateTime),
    /// fires at `time` on every day in `days`
    Weekly { time: NaiveTime, days: RepeatDays },
}

impl Trigger {
    /// One-shot alarms fire at the next `hh:mm`, today if that is still
    /// ahead of `now`, otherwise tomorrow.
    #[must_use]
    pub fn for_alarm(alarm: &AlarmRecord, now: NaiveDateTime) -> Self {
        let time = alarm.time.to_naive_time();
        if alarm.repeat_days.is_empty() {
            let today = now.date().and_time(time);
            if today > now {
                Self::Once(today)
            } else {
                Self::Once(today + Days::new(1))
            }
        } else {
            Self::Weekly {
                time,
                days: alarm.repeat_days,
            }
        }
    }

    /// The first firing strictly after `now`.
    #[must_use]
    pub fn next_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Once(at) => (*at > now).then_some(*at),
            Self::Weekly { time, days } => (0..=7)
                .filter_map(|offset| now.date().checked_add_days(Days::new(offset)))
                .filter(|date| days.contains(date.weekday()))
                .map(|date| date.and_time(*time))
                .find(|at| *at > now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: AlarmId,
    pub title: String,
    pub body: String,
    pub sound: PathBuf,
    pub trigger: Trigger,
}

impl Notification {
    #[must_use]
    pub fn for_alarm(alarm: &AlarmRecord, now: NaiveDateTime) -> Self {
        Self {
            id: alarm.id.clone(),
            title: TITLE.to_string(),
            body: BODY.to_string(),
            sound: alarm.sound.clone(),
            trigger: Trigger::for_alarm(alarm, now),
        }
    }
}

#[derive(Debug)]
struct Entry {
    notification: Notification,
    next: NaiveDateTime,
}

/// Pending notifications, at most one per alarm.
#[derive(Debug, Default)]
pub struct Agenda {
    entries: HashMap<AlarmId, Entry>,
}

impl Agenda {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the notification for its alarm. Returns when it will
    /// fire, or `None` if it never will.
    pub fn insert(
        &mut self,
        notification: Notification,
        now: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        self.entries.remove(&notification.id);
        let next = notification.trigger.next_after(now)?;
        self.entries
            .insert(notification.id.clone(), Entry { notification, next });
        Some(next)
    }

    pub fn cancel(&mut self, id: &AlarmId) -> bool {
        self.entries.remove(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn next_due(&self) -> Option<NaiveDateTime> {
        self.entries.values().map(|entry| entry.next).min()
    }

    /// Removes and returns every notification due at `now`. Weekly ones are
    /// put back for their next day.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<Notification> {
        let due: Vec<AlarmId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.next <= now)
            .map(|(id, _)| id.clone())
            .collect();
        let mut fired = Vec::with_capacity(due.len());
        for id in due {
            let Some(entry) = self.entries.remove(&id) else {
                continue;
            };
            if let Some(next) = entry.notification.trigger.next_after(now) {
                self.entries.insert(
                    id,
                    Entry {
                        notification: entry.notification.clone(),
                        next,
                    },
                );
            }
            fired.push(entry.notification);
        }
        fired
    }
}

/// Handle to the scheduler thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct Scheduler {
    sender: Sender<Message>,
    events: Receiver<Event>,
}

impl Scheduler {
    #[must_use]
    pub fn spawn(tick: Duration) -> Self {
        let (sender, rx) = mpsc::channel();
        let (events_tx, events) = mpsc::channel();
        thread::spawn(move || run(&rx, &events_tx, tick));
        Self { sender, events }
    }

    fn send(&self, message: Message) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| Error::SchedulerStopped)
    }

    /// Schedules the alarm's next occurrence as seen from the scheduler
    /// thread.
    ///
    /// # Errors
    /// if the scheduler thread is gone
    pub fn schedule_alarm(&self, alarm: &AlarmRecord) -> Result<()> {
        self.send(Message::ScheduleAlarm(alarm.clone()))
    }

    /// # Errors
    /// if the scheduler thread is gone
    pub fn schedule(&self, notification: Notification) -> Result<()> {
        self.send(Message::Schedule(notification))
    }

    /// Forgets the alarm's notification and silences it if ringing.
    ///
    /// # Errors
    /// if the scheduler thread is gone
    pub fn cancel(&self, id: AlarmId) -> Result<()> {
        self.send(Message::Cancel(id))
    }

    /// Silences a ringing alarm, its later occurrences stay scheduled.
    ///
    /// # Errors
    /// if the scheduler thread is gone
    pub fn stop(&self, id: AlarmId) -> Result<()> {
        self.send(Message::Stop(id))
    }

    /// events reported since the last call
    pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.events.try_iter()
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn insert(agenda: &mut Agenda, notification: Notification, now: NaiveDateTime) {
    let id = notification.id.clone();
    match agenda.insert(notification, now) {
        Some(at) => info!("alarm {id} scheduled for {at}"),
        None => info!("alarm {id} has no future occurrence"),
    }
}

fn apply(message: Message, agenda: &mut Agenda, ringer: &mut Ringer, now: NaiveDateTime) {
    match message {
        Message::ScheduleAlarm(alarm) => {
            insert(agenda, Notification::for_alarm(&alarm, now), now);
        }
        Message::Schedule(notification) => insert(agenda, notification, now),
        Message::Cancel(id) => {
            if agenda.cancel(&id) {
                info!("alarm {id} cancelled");
            }
            ringer.stop(&id);
        }
        Message::Stop(id) => ringer.stop(&id),
    }
}

fn run(rx: &Receiver<Message>, events: &Sender<Event>, tick: Duration) {
    let mut agenda = Agenda::new();
    let mut ringer = Ringer::new();
    info!("scheduler running, checking every {tick:?}");
    loop {
        match rx.recv_timeout(tick) {
            Ok(message) => apply(message, &mut agenda, &mut ringer, now()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        for notification in agenda.take_due(now()) {
            debug!("alarm {} is due", notification.id);
            let event = match ringer.ring(&notification.id, &notification.sound) {
                Ok(()) => Event::Ringing {
                    id: notification.id,
                    title: notification.title,
                    body: notification.body,
                },
                Err(e) => {
                    error!("couldn't ring alarm {}: {e}", notification.id);
                    Event::Failed {
                        id: notification.id,
                        reason: e.to_string(),
                    }
                }
            };
            if events.send(event).is_err() {
                return;
            }
        }
    }
    info!("scheduler stopped");
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::*;
    use crate::alarm::AlarmTime;

    // 2024-01-03 is a Wednesday
    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn alarm(hour: u8, minute: u8, days: &[Weekday]) -> AlarmRecord {
        AlarmRecord {
            id: format!("{hour}{minute}").into(),
            time: AlarmTime::new(hour, minute).unwrap(),
            sound: PathBuf::from("wake.wav"),
            enabled: true,
            repeat_days: days.iter().copied().collect(),
        }
    }

    #[test]
    fn one_shot_later_today() {
        let trigger = Trigger::for_alarm(&alarm(7, 30, &[]), at(3, 6, 0));
        assert_eq!(trigger, Trigger::Once(at(3, 7, 30)));
    }

    #[test]
    fn one_shot_rolls_to_tomorrow() {
        let trigger = Trigger::for_alarm(&alarm(7, 30, &[]), at(3, 8, 0));
        assert_eq!(trigger, Trigger::Once(at(4, 7, 30)));
        // exactly now is already past
        let trigger = Trigger::for_alarm(&alarm(7, 30, &[]), at(3, 7, 30));
        assert_eq!(trigger, Trigger::Once(at(4, 7, 30)));
    }

    #[test]
    fn weekly_next_occurrence() {
        let trigger = Trigger::for_alarm(&alarm(7, 0, &[Weekday::Mon, Weekday::Wed]), at(3, 6, 0));
        assert!(matches!(trigger, Trigger::Weekly { .. }));
        assert_eq!(trigger.next_after(at(3, 6, 0)), Some(at(3, 7, 0)));
        // after Wednesday's alarm the next one is Monday
        assert_eq!(trigger.next_after(at(3, 7, 0)), Some(at(8, 7, 0)));
    }

    #[test]
    fn weekly_same_day_next_week() {
        let trigger = Trigger::for_alarm(&alarm(7, 0, &[Weekday::Wed]), at(3, 9, 0));
        assert_eq!(trigger.next_after(at(3, 9, 0)), Some(at(10, 7, 0)));
    }

    #[test]
    fn notification_payload() {
        let notification = Notification::for_alarm(&alarm(7, 0, &[]), at(3, 6, 0));
        assert_eq!(notification.title, "Alarm");
        assert_eq!(notification.body, "Your alarm is ringing!");
        assert_eq!(notification.sound, PathBuf::from("wake.wav"));
    }

    #[test]
    fn agenda_fires_one_shot_once() {
        let mut agenda = Agenda::new();
        let now = at(3, 6, 0);
        agenda.insert(Notification::for_alarm(&alarm(7, 0, &[]), now), now);
        assert_eq!(agenda.next_due(), Some(at(3, 7, 0)));

        assert!(agenda.take_due(at(3, 6, 59)).is_empty());
        assert_eq!(agenda.take_due(at(3, 7, 0)).len(), 1);
        assert!(agenda.is_empty());
    }

    #[test]
    fn agenda_reschedules_weekly() {
        let mut agenda = Agenda::new();
        let now = at(3, 6, 0);
        agenda.insert(
            Notification::for_alarm(&alarm(7, 0, &[Weekday::Wed]), now),
            now,
        );
        assert_eq!(agenda.take_due(at(3, 7, 0)).len(), 1);
        assert_eq!(agenda.next_due(), Some(at(10, 7, 0)));
    }

    #[test]
    fn agenda_replace_and_cancel() {
        let mut agenda = Agenda::new();
        let now = at(3, 6, 0);
        let mut first = Notification::for_alarm(&alarm(7, 0, &[]), now);
        agenda.insert(first.clone(), now);
        first.trigger = Trigger::Once(at(3, 9, 0));
        agenda.insert(first.clone(), now);
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda.next_due(), Some(at(3, 9, 0)));

        assert!(agenda.cancel(&first.id));
        assert!(!agenda.cancel(&first.id));
        assert!(agenda.take_due(at(3, 9, 0)).is_empty());
    }

    #[test]
    fn agenda_ignores_past_one_shot() {
        let mut agenda = Agenda::new();
        let mut notification = Notification::for_alarm(&alarm(7, 0, &[]), at(3, 6, 0));
        notification.trigger = Trigger::Once(at(2, 7, 0));
        assert_eq!(agenda.insert(notification, at(3, 6, 0)), None);
        assert!(agenda.is_empty());
    }

    #[test]
    fn alarm_trigger_uses_the_scheduler_clock() {
        // saved just before 07:30, picked up by the scheduler just after
        let mut agenda = Agenda::new();
        let mut ringer = Ringer::new();
        let received = at(3, 7, 30) + chrono::Duration::seconds(1);
        apply(
            Message::ScheduleAlarm(alarm(7, 30, &[])),
            &mut agenda,
            &mut ringer,
            received,
        );
        assert_eq!(agenda.next_due(), Some(at(4, 7, 30)));

        apply(
            Message::Cancel(AlarmId::from("730")),
            &mut agenda,
            &mut ringer,
            received,
        );
        assert!(agenda.is_empty());
    }

    fn missing_sound(id: &str, at: NaiveDateTime) -> Notification {
        Notification {
            id: AlarmId::from(id),
            title: TITLE.to_string(),
            body: BODY.to_string(),
            sound: PathBuf::from("/definitely/not/here.wav"),
            trigger: Trigger::Once(at),
        }
    }

    #[test]
    fn scheduler_reports_alarms_that_cannot_ring() {
        let scheduler = Scheduler::spawn(Duration::from_millis(10));
        let soon = now() + chrono::Duration::seconds(1);
        scheduler.schedule(missing_sound("kept", soon)).unwrap();
        scheduler.schedule(missing_sound("cancelled", soon)).unwrap();
        scheduler.cancel(AlarmId::from("cancelled")).unwrap();

        let mut events = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while events.is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
            events.extend(scheduler.events());
        }
        // both were due at the same moment, leave room for a late second event
        thread::sleep(Duration::from_millis(100));
        events.extend(scheduler.events());

        assert_eq!(events.len(), 1, "{events:?}");
        assert!(matches!(&events[0], Event::Failed { id, .. } if id.as_str() == "kept"));
    }

    #[test]
    fn scheduler_thread_ends_with_its_handle() {
        let (sender, rx) = mpsc::channel();
        let (events_tx, events) = mpsc::channel::<Event>();
        let handle = thread::spawn(move || run(&rx, &events_tx, Duration::from_millis(10)));
        sender.send(Message::Stop(AlarmId::from("1"))).unwrap();
        drop(sender);
        handle.join().unwrap();
        // the event sender is gone with the thread
        assert!(events.recv().is_err());
    }
}

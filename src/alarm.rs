use std::{fmt, path::PathBuf};

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Weekdays in day-number order, `0 = Sunday`.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Opaque alarm identifier, the creation time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(String);

impl AlarmId {
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AlarmId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AlarmId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wake time as 24 hour integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAlarmTime")]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

#[derive(Deserialize)]
struct RawAlarmTime {
    hour: u8,
    minute: u8,
}

impl TryFrom<RawAlarmTime> for AlarmTime {
    type Error = String;

    fn try_from(raw: RawAlarmTime) -> Result<Self, Self::Error> {
        Self::new(raw.hour, raw.minute)
            .ok_or_else(|| format!("invalid alarm time {}:{}", raw.hour, raw.minute))
    }
}

impl AlarmTime {
    #[must_use]
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    #[must_use]
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// formats with a chrono format string such as `%l:%M %p`
    #[must_use]
    pub fn format(&self, time_format: &str) -> String {
        format_time(self.to_naive_time(), time_format)
    }
}

/// Formats `time` with a user supplied chrono format, falling back to
/// `%H:%M` when the format string is invalid.
#[must_use]
pub fn format_time(time: NaiveTime, time_format: &str) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    if write!(out, "{}", time.format(time_format)).is_err() {
        log::debug!("invalid time format {time_format:?}");
        return time.format("%H:%M").to_string();
    }
    out
}

impl From<NaiveTime> for AlarmTime {
    #[allow(clippy::cast_possible_truncation)]
    fn from(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

/// Days an alarm repeats on. Empty means a one-shot alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct RepeatDays {
    // bit n is day n, 0 = Sunday
    mask: u8,
}

impl RepeatDays {
    #[must_use]
    pub const fn new() -> Self {
        Self { mask: 0 }
    }

    fn bit(day: Weekday) -> u8 {
        1u8 << day.num_days_from_sunday()
    }

    #[must_use]
    pub fn contains(&self, day: Weekday) -> bool {
        self.mask & Self::bit(day) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.mask |= Self::bit(day);
    }

    pub fn toggle(&mut self, day: Weekday) {
        self.mask ^= Self::bit(day);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// days in day-number order, Sunday first
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAYS.into_iter().filter(|day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for RepeatDays {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut days = Self::new();
        iter.into_iter().for_each(|day| days.insert(day));
        days
    }
}

impl TryFrom<Vec<u8>> for RepeatDays {
    type Error = String;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        numbers
            .into_iter()
            .map(|n| {
                WEEKDAYS
                    .get(usize::from(n))
                    .copied()
                    .ok_or_else(|| format!("invalid weekday number {n}"))
            })
            .collect()
    }
}

impl From<RepeatDays> for Vec<u8> {
    #[allow(clippy::cast_possible_truncation)]
    fn from(days: RepeatDays) -> Self {
        days.iter().map(|day| day.num_days_from_sunday() as u8).collect()
    }
}

impl fmt::Display for RepeatDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("once");
        }
        let days: Vec<String> = self.iter().map(|day| day.to_string()).collect();
        f.write_str(&days.join(" "))
    }
}

/// A persisted alarm. Only `enabled` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRecord {
    pub id: AlarmId,
    pub time: AlarmTime,
    /// uploaded file or saved recording
    pub sound: PathBuf,
    pub enabled: bool,
    #[serde(default)]
    pub repeat_days: RepeatDays,
}

impl AlarmRecord {
    #[must_use]
    pub fn new(time: AlarmTime, sound: PathBuf, repeat_days: RepeatDays) -> Self {
        Self {
            id: AlarmId::now(),
            time,
            sound,
            enabled: true,
            repeat_days,
        }
    }

    /// file name of the sound, for display
    #[must_use]
    pub fn sound_name(&self) -> String {
        self.sound.file_name().map_or_else(
            || self.sound.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// A recording the user gave a name to. Names need not be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSound {
    pub name: String,
    pub uri: PathBuf,
}

impl fmt::Display for SavedSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uri.to_string_lossy())
    }
}

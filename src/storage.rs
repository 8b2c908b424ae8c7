//! Local key-value storage and the two lists kept in it.
//!
//! Each key is one JSON file. The lists are always read whole, changed in
//! memory and written back whole; the last writer wins.

use std::{io::ErrorKind, path::PathBuf};

use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    alarm::{AlarmId, AlarmRecord, SavedSound},
    error::{StoreError, StoreResult},
};

const KEY_ALARMS: &str = "alarms";
const KEY_SAVED_SOUNDS: &str = "savedSounds";

/// Directory backed key-value store, one file per key.
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    dir: PathBuf,
}

impl KeyValueStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// # Errors
    /// if the file exists but can't be read
    pub fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the value. The new blob is written next to the old one and
    /// renamed over it so a reader never sees half a list.
    ///
    /// # Errors
    /// if the directory can't be created or the file can't be written
    pub fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    /// # Errors
    /// if the file exists but can't be removed
    pub fn remove_item(&self, key: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn get_list<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Vec<T>> {
        match self.get_item(key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn set_list<T: Serialize>(&self, key: &str, items: &[T]) -> StoreResult<()> {
        self.set_item(key, &serde_json::to_string(items)?)
    }
}

/// The alarm list.
#[derive(Debug, Clone)]
pub struct AlarmStore {
    storage: KeyValueStore,
}

impl AlarmStore {
    #[must_use]
    pub const fn new(storage: KeyValueStore) -> Self {
        Self { storage }
    }

    /// # Errors
    /// if the stored list can't be read or parsed
    pub fn list(&self) -> StoreResult<Vec<AlarmRecord>> {
        self.storage.get_list(KEY_ALARMS)
    }

    /// # Errors
    /// if the list can't be written
    pub fn save(&self, alarms: &[AlarmRecord]) -> StoreResult<()> {
        self.storage.set_list(KEY_ALARMS, alarms)
    }

    /// Appends `alarm`.
    ///
    /// # Errors
    /// [`StoreError::DuplicateId`] if the id is taken, otherwise storage errors
    pub fn add(&self, alarm: AlarmRecord) -> StoreResult<Vec<AlarmRecord>> {
        let mut alarms = self.list()?;
        if alarms.iter().any(|a| a.id == alarm.id) {
            return Err(StoreError::DuplicateId(alarm.id));
        }
        info!("adding alarm {} at {:?}", alarm.id, alarm.time);
        alarms.push(alarm);
        self.save(&alarms)?;
        Ok(alarms)
    }

    /// Flips `enabled` of the alarm with `id`. Unknown ids change nothing.
    ///
    /// # Errors
    /// if the list can't be read or written
    pub fn toggle(&self, id: &AlarmId) -> StoreResult<Vec<AlarmRecord>> {
        let mut alarms = self.list()?;
        for alarm in alarms.iter_mut().filter(|a| &a.id == id) {
            alarm.enabled = !alarm.enabled;
            info!("alarm {id} enabled: {}", alarm.enabled);
        }
        self.save(&alarms)?;
        Ok(alarms)
    }

    /// Removes the alarm with `id`. Its sound file is left alone.
    ///
    /// # Errors
    /// if the list can't be read or written
    pub fn delete(&self, id: &AlarmId) -> StoreResult<Vec<AlarmRecord>> {
        let mut alarms = self.list()?;
        alarms.retain(|a| &a.id != id);
        info!("deleted alarm {id}");
        self.save(&alarms)?;
        Ok(alarms)
    }
}

/// Recordings the user named.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    storage: KeyValueStore,
}

impl SoundLibrary {
    #[must_use]
    pub const fn new(storage: KeyValueStore) -> Self {
        Self { storage }
    }

    /// # Errors
    /// if the stored list can't be read or parsed
    pub fn list(&self) -> StoreResult<Vec<SavedSound>> {
        self.storage.get_list(KEY_SAVED_SOUNDS)
    }

    /// Appends `sound`, even if the name is already used.
    ///
    /// # Errors
    /// if the list can't be read or written
    pub fn add(&self, sound: SavedSound) -> StoreResult<Vec<SavedSound>> {
        let mut sounds = self.list()?;
        info!("saving sound {sound}");
        sounds.push(sound);
        self.storage.set_list(KEY_SAVED_SOUNDS, &sounds)?;
        Ok(sounds)
    }
}

//! Preference storage as JSON files.
//!
//! Every player gets `preferences_<uuid>.json` in the data directory.
//! Files are written to a temporary sibling first and renamed into place, so
//! a record on disk is always complete.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use super::PreferenceStore;
use crate::core::error::StoreError;
use crate::core::model::{DisplayMode, NotifyPreference, PlayerId, PlayerPreference};

pub struct JsonFileStore {
    /// Directory holding the preference files
    data_dir: PathBuf,
    /// Serializes read-modify-write sequences
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store, creating the data directory if needed.
    pub fn open(data_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the path to a player's preference file.
    fn preference_path(&self, id: &PlayerId) -> PathBuf {
        self.data_dir.join(format!("preferences_{}.json", id))
    }

    fn read_file(path: &Path) -> Result<Option<PlayerPreference>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(&self, preference: &PlayerPreference) -> Result<(), StoreError> {
        let path = self.preference_path(&preference.player_id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(preference)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn modify<F>(&self, id: &PlayerId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut PlayerPreference),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = Self::read_file(&self.preference_path(id))?.ok_or(StoreError::NotFound(*id))?;
        apply(&mut record);
        self.write_file(&record)
    }

    /// List the player ids that have a preference file.
    pub fn stored_players(&self) -> Result<Vec<PlayerId>, StoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();

            // Parse preferences_<uuid>.json
            if let Some(id_str) = filename
                .strip_prefix("preferences_")
                .and_then(|s| s.strip_suffix(".json"))
            {
                if let Ok(id) = Uuid::parse_str(id_str) {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self, id: &PlayerId) -> Result<Option<PlayerPreference>, StoreError> {
        Self::read_file(&self.preference_path(id))
    }

    fn create(&self, preference: &PlayerPreference) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_file(preference)
    }

    fn update_all(&self, preference: &PlayerPreference) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.preference_path(&preference.player_id).exists() {
            return Err(StoreError::NotFound(preference.player_id));
        }
        self.write_file(preference)
    }

    fn delete(&self, id: &PlayerId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(self.preference_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_all(&self) -> Result<Vec<PlayerPreference>, StoreError> {
        let mut records = Vec::new();
        for id in self.stored_players()? {
            match self.load(&id) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                // One broken file should not hide everybody else
                Err(e) => log::error!("Skipping unreadable preferences of {}: {}", id, e),
            }
        }
        Ok(records)
    }

    fn update_sound(&self, id: &PlayerId, sound_key: &str) -> Result<(), StoreError> {
        self.modify(id, |record| record.sound_key = sound_key.to_string())
    }

    fn update_display(&self, id: &PlayerId, display: DisplayMode) -> Result<(), StoreError> {
        self.modify(id, |record| record.display_mode = display)
    }

    fn update_preference(&self, id: &PlayerId, preference: NotifyPreference) -> Result<(), StoreError> {
        self.modify(id, |record| record.notify_preference = preference)
    }
}

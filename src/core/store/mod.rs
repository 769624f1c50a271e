// Durable preference storage.
//
// Backends:
// - json.rs: one JSON file per player in a data directory
// - memory.rs: process-local map, for tests and throwaway servers

pub mod json;
pub mod memory;

use std::sync::Arc;

use super::config::{StorageKind, StorageSettings};
use super::error::StoreError;
use super::model::{DisplayMode, NotifyPreference, PlayerId, PlayerPreference};

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Contract every preference backend fulfils. Calls may block.
pub trait PreferenceStore: Send + Sync {
    /// Stored record for a player, `None` if the player never joined.
    fn load(&self, id: &PlayerId) -> Result<Option<PlayerPreference>, StoreError>;

    /// Write a complete new record.
    fn create(&self, preference: &PlayerPreference) -> Result<(), StoreError>;

    /// Replace all fields of an existing record.
    fn update_all(&self, preference: &PlayerPreference) -> Result<(), StoreError>;

    fn delete(&self, id: &PlayerId) -> Result<(), StoreError>;

    fn list_all(&self) -> Result<Vec<PlayerPreference>, StoreError>;

    fn update_sound(&self, id: &PlayerId, sound_key: &str) -> Result<(), StoreError> {
        let mut record = self.load(id)?.ok_or(StoreError::NotFound(*id))?;
        record.sound_key = sound_key.to_string();
        self.update_all(&record)
    }

    fn update_display(&self, id: &PlayerId, display: DisplayMode) -> Result<(), StoreError> {
        let mut record = self.load(id)?.ok_or(StoreError::NotFound(*id))?;
        record.display_mode = display;
        self.update_all(&record)
    }

    fn update_preference(&self, id: &PlayerId, preference: NotifyPreference) -> Result<(), StoreError> {
        let mut record = self.load(id)?.ok_or(StoreError::NotFound(*id))?;
        record.notify_preference = preference;
        self.update_all(&record)
    }
}

/// Open the backend selected in the settings.
pub fn open(settings: &StorageSettings) -> Result<Arc<dyn PreferenceStore>, StoreError> {
    match settings.kind {
        StorageKind::Json => {
            let store = JsonFileStore::open(settings.directory.clone())?;
            log::info!("Using JSON preference store in {:?}", settings.directory);
            Ok(Arc::new(store))
        }
        StorageKind::Memory => {
            log::info!("Using in-memory preference store; preferences are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

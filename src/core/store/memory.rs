use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::PreferenceStore;
use crate::core::error::StoreError;
use crate::core::model::{DisplayMode, NotifyPreference, PlayerId, PlayerPreference};

/// Preference store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<PlayerId, PlayerPreference>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, id: &PlayerId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut PlayerPreference),
    {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        apply(record);
        Ok(())
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, id: &PlayerId) -> Result<Option<PlayerPreference>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(id).cloned())
    }

    fn create(&self, preference: &PlayerPreference) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(preference.player_id, preference.clone());
        Ok(())
    }

    fn update_all(&self, preference: &PlayerPreference) -> Result<(), StoreError> {
        let replacement = preference.clone();
        self.modify(&preference.player_id, move |record| *record = replacement)
    }

    fn delete(&self, id: &PlayerId) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.remove(id);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<PlayerPreference>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.values().cloned().collect())
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

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_update_requires_existing_record() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let err = store.update_display(&id, DisplayMode::ChatOnly).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id));

        store
            .create(&PlayerPreference::new(id, "none", DisplayMode::All, NotifyPreference::Always))
            .unwrap();
        store.update_display(&id, DisplayMode::ChatOnly).unwrap();
        store.update_preference(&id, NotifyPreference::Never).unwrap();

        let record = store.load(&id).unwrap().unwrap();
        assert_eq!(record.display_mode, DisplayMode::ChatOnly);
        assert_eq!(record.notify_preference, NotifyPreference::Never);
        assert_eq!(record.sound_key, "none");
    }

    #[test]
    fn test_delete_and_list() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for id in [a, b] {
            store
                .create(&PlayerPreference::new(id, "none", DisplayMode::All, NotifyPreference::Always))
                .unwrap();
        }
        assert_eq!(store.list_all().unwrap().len(), 2);

        store.delete(&a).unwrap();
        assert!(store.load(&a).unwrap().is_none());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}

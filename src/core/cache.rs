//! In-memory mirror of online players' preferences plus the mention cooldown table.
//!
//! One instance is created per process and handed to the engine by reference.
//! Both maps sit behind their own `RwLock`, so a chat pass reading preferences
//! never waits on a command that is arming a cooldown.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::model::{PlayerId, PlayerPreference};

#[derive(Debug, Default)]
pub struct PreferenceCache {
    /// Preferences of players currently online
    players: RwLock<HashMap<PlayerId, PlayerPreference>>,
    /// Cooldown expiry per mentioner
    cooldowns: RwLock<HashMap<PlayerId, DateTime<Utc>>>,
}

// A panic while holding a guard cannot leave a map half-written, so poisoned
// locks are still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl PreferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a player's cached preferences.
    pub fn get(&self, id: &PlayerId) -> Option<PlayerPreference> {
        read(&self.players).get(id).cloned()
    }

    pub fn put(&self, id: PlayerId, preference: PlayerPreference) {
        write(&self.players).insert(id, preference);
    }

    pub fn remove(&self, id: &PlayerId) -> Option<PlayerPreference> {
        write(&self.players).remove(id)
    }

    /// Mutate a cached entry in place. Returns false when the player is not cached.
    pub fn update<F>(&self, id: &PlayerId, apply: F) -> bool
    where
        F: FnOnce(&mut PlayerPreference),
    {
        match write(&self.players).get_mut(id) {
            Some(entry) => {
                apply(entry);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        read(&self.players).contains_key(id)
    }

    /// (Re)arm a mentioner's cooldown. Expired entries are dropped on the way.
    pub fn arm_cooldown(&self, id: PlayerId, expiry: DateTime<Utc>, now: DateTime<Utc>) {
        let mut cooldowns = write(&self.cooldowns);
        cooldowns.retain(|_, until| now < *until);
        cooldowns.insert(id, expiry);
    }

    pub fn is_on_cooldown(&self, id: &PlayerId, now: DateTime<Utc>) -> bool {
        read(&self.cooldowns)
            .get(id)
            .map(|until| now < *until)
            .unwrap_or(false)
    }

    pub fn cooldown_entries(&self) -> usize {
        read(&self.cooldowns).len()
    }
}

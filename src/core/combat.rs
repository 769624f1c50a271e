//! Combat-status providers.
//!
//! `NoCombatTracking` is used when the host has no combat integration.
//! `CombatTagTracker` is fed by the host's damage events: a tagged player is
//! in combat until `tag_duration` after the last tag.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

use super::clock::Clock;
use super::config::{CombatProvider, CombatSettings};
use super::model::PlayerId;

pub trait CombatStatus: Send + Sync {
    fn is_in_combat(&self, id: &PlayerId) -> bool;
}

/// Nobody is ever in combat.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCombatTracking;

impl CombatStatus for NoCombatTracking {
    fn is_in_combat(&self, _id: &PlayerId) -> bool {
        false
    }
}

pub struct CombatTagTracker {
    clock: Arc<dyn Clock>,
    tag_duration: Duration,
    /// Combat expiry per player
    tags: RwLock<HashMap<PlayerId, DateTime<Utc>>>,
}

impl CombatTagTracker {
    pub fn new(clock: Arc<dyn Clock>, tag_duration: Duration) -> Self {
        Self {
            clock,
            tag_duration,
            tags: RwLock::new(HashMap::new()),
        }
    }

    /// Put a player in combat, or extend an existing tag.
    pub fn tag(&self, id: PlayerId) {
        let now = self.clock.now();
        let mut tags = self.tags.write().unwrap_or_else(PoisonError::into_inner);
        tags.retain(|_, until| now < *until);
        tags.insert(id, now + self.tag_duration);
    }

    pub fn untag(&self, id: &PlayerId) {
        self.tags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

impl CombatStatus for CombatTagTracker {
    fn is_in_combat(&self, id: &PlayerId) -> bool {
        let now = self.clock.now();
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|until| now < *until)
            .unwrap_or(false)
    }
}

/// Combat provider chosen at start-up.
#[derive(Clone)]
pub enum CombatHook {
    Disabled(NoCombatTracking),
    Tagging(Arc<CombatTagTracker>),
}

impl CombatHook {
    pub fn from_settings(settings: &CombatSettings, clock: Arc<dyn Clock>) -> Self {
        match settings.provider {
            CombatProvider::None => Self::Disabled(NoCombatTracking),
            CombatProvider::Tagging => Self::Tagging(Arc::new(CombatTagTracker::new(
                clock,
                Duration::seconds(settings.tag_seconds.max(0)),
            ))),
        }
    }

    /// The tracker to feed damage events into, if tagging is enabled.
    pub fn tracker(&self) -> Option<&Arc<CombatTagTracker>> {
        match self {
            Self::Disabled(_) => None,
            Self::Tagging(tracker) => Some(tracker),
        }
    }

    pub fn provider(&self) -> Arc<dyn CombatStatus> {
        match self {
            Self::Disabled(stub) => Arc::new(*stub) as Arc<dyn CombatStatus>,
            Self::Tagging(tracker) => Arc::clone(tracker) as Arc<dyn CombatStatus>,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use uuid::Uuid;

    #[test]
    fn test_stub_never_in_combat() {
        assert!(!NoCombatTracking.is_in_combat(&Uuid::new_v4()));
    }

    #[test]
    fn test_tag_expires() {
        let clock = Arc::new(ManualClock::default());
        let tracker = CombatTagTracker::new(clock.clone(), Duration::seconds(10));
        let id = Uuid::new_v4();

        assert!(!tracker.is_in_combat(&id));
        tracker.tag(id);
        assert!(tracker.is_in_combat(&id));

        clock.advance(Duration::seconds(9));
        assert!(tracker.is_in_combat(&id));
        clock.advance(Duration::seconds(1));
        assert!(!tracker.is_in_combat(&id));
    }

    #[test]
    fn test_retag_extends_and_untag_clears() {
        let clock = Arc::new(ManualClock::default());
        let tracker = CombatTagTracker::new(clock.clone(), Duration::seconds(10));
        let id = Uuid::new_v4();

        tracker.tag(id);
        clock.advance(Duration::seconds(8));
        tracker.tag(id);
        clock.advance(Duration::seconds(8));
        assert!(tracker.is_in_combat(&id));

        tracker.untag(&id);
        assert!(!tracker.is_in_combat(&id));
    }

    #[test]
    fn test_hook_from_settings() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        let disabled = CombatHook::from_settings(&CombatSettings::default(), clock.clone());
        assert!(disabled.tracker().is_none());

        let tagging = CombatHook::from_settings(
            &CombatSettings {
                provider: CombatProvider::Tagging,
                tag_seconds: 5,
            },
            clock,
        );
        let id = Uuid::new_v4();
        tagging.tracker().unwrap().tag(id);
        assert!(tagging.provider().is_in_combat(&id));
    }
}

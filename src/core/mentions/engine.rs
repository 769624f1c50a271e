// Mention engine - the entry points the host calls.
//
// Chat processing only reads the preference cache and never touches storage.
// Join and the setting commands go to storage on a blocking worker with a
// bounded wait. The cache is only changed after storage acknowledged, by the
// worker itself, so a timed-out caller cannot leave the two apart.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration as StdDuration;

use chrono::Duration;

use super::dispatch::{Dispatcher, Notification};
use super::format::FormatResolver;
use super::policy::{decide, Decision};
use super::scanner::{scan, MatchRule, ScanLimits};
use crate::core::cache::PreferenceCache;
use crate::core::clock::Clock;
use crate::core::combat::CombatStatus;
use crate::core::config::Settings;
use crate::core::error::{PreferenceError, StoreError};
use crate::core::host::{CapabilityCheck, NotificationChannels};
use crate::core::model::{DisplayMode, NotifyPreference, PlayerId, PlayerPreference, RosterEntry};
use crate::core::sound::SoundCatalog;
use crate::core::store::PreferenceStore;

/// Host-provided capabilities the engine calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub combat: Arc<dyn CombatStatus>,
    pub capabilities: Arc<dyn CapabilityCheck>,
    pub channels: Arc<dyn NotificationChannels>,
    pub clock: Arc<dyn Clock>,
}

/// Everything derived from `Settings`, swapped as a whole on reload.
struct EngineConfig {
    settings: Settings,
    rule: MatchRule,
    limits: ScanLimits,
    formats: FormatResolver,
    dispatcher: Dispatcher,
    /// `None` when cooldowns are disabled
    cooldown: Option<Duration>,
    store_timeout: StdDuration,
}

impl EngineConfig {
    fn build(settings: Settings) -> Self {
        let cooldown = if settings.limits.mention_cooldown_seconds < 1 {
            None
        } else {
            Some(Duration::seconds(settings.limits.mention_cooldown_seconds))
        };
        Self {
            rule: MatchRule::from_settings(&settings.formatting),
            limits: ScanLimits::from(&settings.limits),
            formats: FormatResolver::from_settings(&settings.formatting),
            dispatcher: Dispatcher::from_settings(&settings),
            cooldown,
            store_timeout: StdDuration::from_millis(settings.storage.timeout_ms),
            settings,
        }
    }

    fn default_preference(&self, id: PlayerId) -> PlayerPreference {
        let defaults = &self.settings.defaults;
        PlayerPreference::new(id, defaults.sound.clone(), defaults.display, defaults.preference)
    }
}

/// Result of processing one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionOutcome {
    pub text: String,
    /// Players credited with a mention, in roster order
    pub matches: Vec<PlayerId>,
    /// Players that were actually notified
    pub notified: Vec<PlayerId>,
}

pub struct MentionEngine {
    cache: Arc<PreferenceCache>,
    store: Arc<dyn PreferenceStore>,
    hooks: Collaborators,
    config: RwLock<Arc<EngineConfig>>,
}

impl MentionEngine {
    pub fn new(
        settings: Settings,
        cache: Arc<PreferenceCache>,
        store: Arc<dyn PreferenceStore>,
        hooks: Collaborators,
    ) -> Self {
        Self {
            cache,
            store,
            hooks,
            config: RwLock::new(Arc::new(EngineConfig::build(settings))),
        }
    }

    fn config(&self) -> Arc<EngineConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the settings (hot-reload friendly). Cached preferences are kept.
    pub fn update_config(&self, settings: Settings) {
        let built = Arc::new(EngineConfig::build(settings));
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = built;
        log::info!("Mention settings reloaded");
    }

    pub fn settings(&self) -> Settings {
        self.config().settings.clone()
    }

    pub fn sound_catalog(&self) -> SoundCatalog {
        self.config().dispatcher.catalog().clone()
    }

    pub fn cache(&self) -> &Arc<PreferenceCache> {
        &self.cache
    }

    /// Cached preferences of an online player.
    pub fn preferences(&self, id: &PlayerId) -> Option<PlayerPreference> {
        self.cache.get(id)
    }

    /// Rewrite an outgoing chat message and notify the players it mentions.
    ///
    /// Never fails: problems are logged and the affected player is skipped.
    pub fn process_outgoing_message(&self, sender: &RosterEntry, raw: &str, roster: &[RosterEntry]) -> String {
        self.process_message(sender, raw, roster).text
    }

    pub fn process_message(&self, sender: &RosterEntry, raw: &str, roster: &[RosterEntry]) -> MentionOutcome {
        let config = self.config();
        let capabilities = self.hooks.capabilities.as_ref();

        let scanned = scan(raw, roster, &sender.id, &config.rule, config.limits, |player| {
            config.formats.resolve_marker(player, capabilities)
        });

        let mut outcome = MentionOutcome {
            text: scanned.text,
            matches: scanned.matches,
            notified: Vec::new(),
        };
        if outcome.matches.is_empty() {
            return outcome;
        }

        let now = self.hooks.clock.now();
        if self.cache.is_on_cooldown(&sender.id, now) {
            log::debug!("{} is on mention cooldown, not notifying anyone", sender.name);
            return outcome;
        }

        for id in &outcome.matches {
            let Some(preference) = self.cache.get(id) else {
                log::error!("No cached mention preferences for {}", id);
                continue;
            };

            match decide(preference.notify_preference, || self.hooks.combat.is_in_combat(id)) {
                Decision::Skip => {
                    log::debug!("{} is not notified ({})", id, preference.notify_preference);
                }
                Decision::Notify { silent } => {
                    config.dispatcher.dispatch(
                        self.hooks.channels.as_ref(),
                        &Notification {
                            recipient: *id,
                            sound_key: &preference.sound_key,
                            display: preference.display_mode,
                            silent,
                            mentioner_name: &sender.name,
                        },
                    );
                    outcome.notified.push(*id);
                }
            }
        }

        if !outcome.notified.is_empty() {
            if let Some(cooldown) = config.cooldown {
                self.cache.arm_cooldown(sender.id, now + cooldown, now);
            }
        }

        outcome
    }

    /// Run a store operation off the calling task, waiting at most the configured timeout.
    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn PreferenceStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let timeout = self.config().store_timeout;
        let task = tokio::task::spawn_blocking(move || op(store.as_ref()));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StoreError::TaskFailed(e.to_string())),
            Err(_) => Err(StoreError::Timeout(timeout)),
        }
    }

    /// Load (or create with defaults) a joining player's preferences into the cache.
    ///
    /// On failure the player stays uncached and is simply not notified.
    pub async fn on_player_join(&self, id: PlayerId) -> Result<PlayerPreference, StoreError> {
        let defaults = self.config().default_preference(id);
        let loaded = self
            .with_store(move |store| match store.load(&id)? {
                Some(existing) => Ok(existing),
                None => {
                    store.create(&defaults)?;
                    log::info!("Created default mention preferences for {}", id);
                    Ok(defaults)
                }
            })
            .await;

        match loaded {
            Ok(preference) => {
                self.cache.put(id, preference.clone());
                Ok(preference)
            }
            Err(e) => {
                log::error!("Could not load mention preferences for {}: {}", id, e);
                Err(e)
            }
        }
    }

    pub fn on_player_leave(&self, id: &PlayerId) {
        self.cache.remove(id);
    }

    /// Validate and store a sound key. Returns the stored value.
    pub async fn set_sound(&self, id: PlayerId, sound_key: &str) -> Result<String, PreferenceError> {
        let stored = self
            .sound_catalog()
            .parse_setting(sound_key)
            .ok_or_else(|| PreferenceError::InvalidSound(sound_key.to_string()))?;

        let value = stored.clone();
        let mirrored = stored.clone();
        self.persist(
            id,
            move |store| store.update_sound(&id, &value),
            move |cache| {
                cache.update(&id, |p| p.sound_key = mirrored);
            },
        )
        .await?;
        Ok(stored)
    }

    pub async fn set_display(&self, id: PlayerId, display: DisplayMode) -> Result<(), PreferenceError> {
        self.persist(
            id,
            move |store| store.update_display(&id, display),
            move |cache| {
                cache.update(&id, |p| p.display_mode = display);
            },
        )
        .await
    }

    pub async fn set_preference(&self, id: PlayerId, preference: NotifyPreference) -> Result<(), PreferenceError> {
        self.persist(
            id,
            move |store| store.update_preference(&id, preference),
            move |cache| {
                cache.update(&id, |p| p.notify_preference = preference);
            },
        )
        .await
    }

    /// Put all of a player's settings back to the configured defaults.
    pub async fn reset_preferences(&self, id: PlayerId) -> Result<PlayerPreference, PreferenceError> {
        let defaults = self.config().default_preference(id);
        let record = defaults.clone();
        let mirrored = defaults.clone();
        self.persist(
            id,
            move |store| store.update_all(&record),
            move |cache| {
                cache.update(&id, |p| *p = mirrored);
            },
        )
        .await?;
        Ok(defaults)
    }

    /// Every stored preference record, online or not.
    pub async fn stored_preferences(&self) -> Result<Vec<PlayerPreference>, StoreError> {
        self.with_store(|store| store.list_all()).await
    }

    /// Drop a player's stored and cached preferences.
    pub async fn forget_player(&self, id: PlayerId) -> Result<(), StoreError> {
        self.with_store(move |store| store.delete(&id)).await?;
        self.cache.remove(&id);
        Ok(())
    }

    /// Store a change, then mirror it into the cache from the same worker.
    ///
    /// The mirror runs whenever the store acknowledges, even after the caller
    /// stopped waiting.
    async fn persist<F, M>(&self, id: PlayerId, op: F, mirror: M) -> Result<(), PreferenceError>
    where
        F: FnOnce(&dyn PreferenceStore) -> Result<(), StoreError> + Send + 'static,
        M: FnOnce(&PreferenceCache) + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        self.with_store(move |store| {
            op(store)?;
            mirror(&cache);
            Ok(())
        })
        .await
        .map_err(|e| {
            log::error!("Could not update mention preferences for {}: {}", id, e);
            PreferenceError::Store(e)
        })
    }
}

//! Console host for the mention engine.
//!
//! Stands in for a game server: players join and chat through stdin lines and
//! every notification is printed. Useful for trying out a settings.json.
//!
//! ```text
//! join <name>              leave <name>
//! say <name> <message>     cmd <name> <args..>
//! complete <args..>        grant <name> <capability>
//! combat <name>            players
//! quit
//! ```

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::core::{
    cache::PreferenceCache,
    clock::{Clock, SystemClock},
    combat::CombatHook,
    command::{complete, MentionCommand},
    config::{ConfigManager, Settings},
    error::ChannelError,
    host::{CapabilityCheck, NotificationChannels},
    mentions::{engine::Collaborators, MentionEngine},
    model::{PlayerId, RosterEntry},
    store::{self, PreferenceStore},
};

/// Prints every notification to stdout.
struct ConsoleChannels {
    names: Arc<RwLock<HashMap<PlayerId, String>>>,
}

impl ConsoleChannels {
    fn name(&self, id: &PlayerId) -> String {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn deliver(&self, channel: &str, id: &PlayerId, text: &str) -> Result<(), ChannelError> {
        writeln!(io::stdout().lock(), "  [{} -> {}] {}", channel, self.name(id), text)
            .map_err(|e| ChannelError::Failed(e.to_string()))
    }
}

impl NotificationChannels for ConsoleChannels {
    fn send_chat_line(&self, id: &PlayerId, text: &str) -> Result<(), ChannelError> {
        self.deliver("chat", id, text)
    }

    fn send_status_line(&self, id: &PlayerId, text: &str) -> Result<(), ChannelError> {
        self.deliver("actionbar", id, text)
    }

    fn play_cue(&self, id: &PlayerId, cue: &str, volume: f32, pitch: f32) -> Result<(), ChannelError> {
        let text = format!("{} (volume {:.1}, pitch {:.1})", cue, volume, pitch);
        self.deliver("sound", id, &text)
    }
}

/// Capabilities granted from the console.
#[derive(Default)]
struct ConsoleGrants {
    granted: RwLock<HashSet<(PlayerId, String)>>,
}

impl CapabilityCheck for ConsoleGrants {
    fn has_capability(&self, id: &PlayerId, capability: &str) -> bool {
        self.granted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(*id, capability.to_string()))
    }
}

struct Console {
    engine: MentionEngine,
    config_manager: ConfigManager,
    combat: CombatHook,
    grants: Arc<ConsoleGrants>,
    names: Arc<RwLock<HashMap<PlayerId, String>>>,
    /// Online players in join order
    roster: Vec<RosterEntry>,
}

impl Console {
    fn new(
        settings: Settings,
        store: Arc<dyn PreferenceStore>,
        config_manager: ConfigManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let combat = CombatHook::from_settings(&settings.combat, Arc::clone(&clock));
        let grants = Arc::new(ConsoleGrants::default());
        let names = Arc::new(RwLock::new(HashMap::new()));

        let engine = MentionEngine::new(
            settings,
            Arc::new(PreferenceCache::new()),
            store,
            Collaborators {
                combat: combat.provider(),
                capabilities: grants.clone(),
                channels: Arc::new(ConsoleChannels { names: names.clone() }),
                clock,
            },
        );

        Self {
            engine,
            config_manager,
            combat,
            grants,
            names,
            roster: Vec::new(),
        }
    }

    fn find(&self, name: &str) -> Option<RosterEntry> {
        self.roster.iter().find(|p| p.name == name).cloned()
    }

    async fn handle(&mut self, line: &str) -> bool {
        let mut parts = line.trim().splitn(3, ' ');
        let verb = parts.next().unwrap_or("");
        let name = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");

        match verb {
            "" => {}
            "quit" | "exit" => return false,
            "join" if !name.is_empty() => {
                if self.find(name).is_some() {
                    println!("{} is already online", name);
                    return true;
                }
                // Stable id per name, so JSON stores survive restarts
                let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
                if let Err(e) = self.engine.on_player_join(id).await {
                    println!("{} could not join: {}", name, e);
                    return true;
                }
                println!("{} joined", name);
                self.names
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(id, name.to_string());
                self.roster.push(RosterEntry::new(id, name));
            }
            "leave" => match self.find(name) {
                Some(player) => {
                    self.engine.on_player_leave(&player.id);
                    self.roster.retain(|p| p.id != player.id);
                    println!("{} left", name);
                }
                None => println!("{} is not online", name),
            },
            "say" => match self.find(name) {
                Some(sender) => {
                    let text = self.engine.process_outgoing_message(&sender, rest, &self.roster);
                    println!("<{}> {}", sender.name, text);
                }
                None => println!("{} is not online", name),
            },
            "cmd" => match self.find(name) {
                Some(player) => {
                    let args: Vec<&str> = rest.split_whitespace().collect();
                    match MentionCommand::parse(&args) {
                        Ok(command) => {
                            let reply = command.execute(&self.engine, player.id, &self.config_manager).await;
                            println!("{}", reply);
                        }
                        Err(e) => println!("{}", e),
                    }
                }
                None => println!("{} is not online", name),
            },
            "complete" => {
                let joined = format!("{} {}", name, rest);
                let mut args: Vec<&str> = joined.split_whitespace().collect();
                if line.ends_with(' ') {
                    args.push("");
                }
                let options = complete(&args, &self.engine.sound_catalog());
                println!("{}", options.join("  "));
            }
            "grant" => match self.find(name) {
                Some(player) if !rest.is_empty() => {
                    self.grants
                        .granted
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert((player.id, rest.trim().to_string()));
                    println!("granted {} to {}", rest.trim(), name);
                }
                _ => println!("usage: grant <online player> <capability>"),
            },
            "combat" => match (self.find(name), self.combat.tracker()) {
                (Some(player), Some(tracker)) => {
                    tracker.tag(player.id);
                    println!("{} is in combat", name);
                }
                (None, _) => println!("{} is not online", name),
                (_, None) => println!("combat tracking is disabled (combat.provider = \"none\")"),
            },
            "players" => match self.engine.stored_preferences().await {
                Ok(records) => {
                    println!("{} online, {} stored", self.roster.len(), records.len());
                    for record in records {
                        println!(
                            "  {} sound={} display={} preference={}",
                            record.player_id, record.sound_key, record.display_mode, record.notify_preference
                        );
                    }
                }
                Err(e) => println!("could not list stored players: {}", e),
            },
            other => println!("unknown input '{}'", other),
        }
        true
    }
}

async fn run_console(config_dir: PathBuf) {
    let config_manager = ConfigManager::new(config_dir);
    let settings = config_manager.load();

    let store = match store::open(&settings.storage) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Could not open preference storage: {}", e);
            return;
        }
    };

    let mut console = Console::new(settings, store, config_manager, Arc::new(SystemClock));

    log::info!("Mention console ready");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !console.handle(&line).await {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        }
    }
}

pub fn run() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime.block_on(run_console(config_dir)),
        Err(e) => log::error!("Could not start async runtime: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::error::StoreError;
    use crate::core::model::PlayerPreference;
    use crate::core::store::MemoryStore;

    /// Storage that refuses every request.
    struct OfflineStore;

    fn offline<T>() -> Result<T, StoreError> {
        Err(StoreError::TaskFailed("storage offline".to_string()))
    }

    impl PreferenceStore for OfflineStore {
        fn load(&self, _id: &PlayerId) -> Result<Option<PlayerPreference>, StoreError> {
            offline()
        }
        fn create(&self, _preference: &PlayerPreference) -> Result<(), StoreError> {
            offline()
        }
        fn update_all(&self, _preference: &PlayerPreference) -> Result<(), StoreError> {
            offline()
        }
        fn delete(&self, _id: &PlayerId) -> Result<(), StoreError> {
            offline()
        }
        fn list_all(&self) -> Result<Vec<PlayerPreference>, StoreError> {
            offline()
        }
    }

    fn console(store: Arc<dyn PreferenceStore>) -> Console {
        Console::new(
            Settings::default(),
            store,
            ConfigManager::new(PathBuf::from("unused")),
            Arc::new(ManualClock::default()),
        )
    }

    #[tokio::test]
    async fn test_failed_join_keeps_player_offline() {
        let mut console = console(Arc::new(OfflineStore));

        assert!(console.handle("join Steve").await);
        assert!(console.find("Steve").is_none());
        assert!(console.names.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_join_chat_leave() {
        let mut console = console(Arc::new(MemoryStore::new()));

        console.handle("join Steve").await;
        console.handle("join Alex").await;
        console.handle("join Alex").await;
        assert_eq!(console.roster.len(), 2);

        let steve = console.find("Steve").unwrap();
        let alex = console.find("Alex").unwrap();
        let outcome = console.engine.process_message(&alex, "hi @Steve", &console.roster);
        assert_eq!(outcome.notified, vec![steve.id]);

        console.handle("leave Steve").await;
        assert!(console.find("Steve").is_none());
        assert!(console.engine.preferences(&steve.id).is_none());
        assert!(!console.handle("quit").await);
    }
}

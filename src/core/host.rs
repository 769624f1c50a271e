// Capabilities the hosting game server provides to the engine.

use super::error::ChannelError;
use super::model::PlayerId;

/// Permission lookup used to pick a player's mention format.
pub trait CapabilityCheck: Send + Sync {
    fn has_capability(&self, id: &PlayerId, capability: &str) -> bool;
}

/// Grants nothing. Every mention uses the default format.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapabilities;

impl CapabilityCheck for NoCapabilities {
    fn has_capability(&self, _id: &PlayerId, _capability: &str) -> bool {
        false
    }
}

/// Output channels for a notification. Text is passed through unformatted.
pub trait NotificationChannels: Send + Sync {
    fn send_chat_line(&self, id: &PlayerId, text: &str) -> Result<(), ChannelError>;

    /// Short-lived line shown above the hotbar.
    fn send_status_line(&self, id: &PlayerId, text: &str) -> Result<(), ChannelError>;

    fn play_cue(&self, id: &PlayerId, cue: &str, volume: f32, pitch: f32) -> Result<(), ChannelError>;
}

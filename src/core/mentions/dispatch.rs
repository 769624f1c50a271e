// Notification fan-out.
//
// Each channel is attempted independently; a failing send is logged and the
// remaining channels still run.

use crate::core::config::Settings;
use crate::core::host::NotificationChannels;
use crate::core::model::{DisplayMode, PlayerId};
use crate::core::sound::{CueChoice, SoundCatalog};

use super::format::fill_template;

/// One decided notification.
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    pub recipient: PlayerId,
    pub sound_key: &'a str,
    pub display: DisplayMode,
    /// Suppresses the audio cue regardless of display mode
    pub silent: bool,
    pub mentioner_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    catalog: SoundCatalog,
    default_sound: String,
    volume: f32,
    pitch: f32,
    chat_template: String,
    status_template: String,
}

impl Dispatcher {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            catalog: SoundCatalog::new(&settings.sounds),
            default_sound: settings.defaults.sound.clone(),
            volume: settings.notification.volume,
            pitch: settings.notification.pitch,
            chat_template: settings.notification.chat_message.clone(),
            status_template: settings.notification.status_message.clone(),
        }
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn dispatch(&self, channels: &dyn NotificationChannels, notification: &Notification<'_>) {
        let wanted = notification.display.channels();
        let recipient = &notification.recipient;

        if wanted.chat {
            let text = fill_template(&self.chat_template, notification.mentioner_name);
            if let Err(e) = channels.send_chat_line(recipient, &text) {
                log::error!("Failed to send mention chat line to {}: {}", recipient, e);
            }
        }

        if wanted.status {
            let text = fill_template(&self.status_template, notification.mentioner_name);
            if let Err(e) = channels.send_status_line(recipient, &text) {
                log::error!("Failed to send mention status line to {}: {}", recipient, e);
            }
        }

        if wanted.sound && !notification.silent {
            match self.catalog.resolve(notification.sound_key, &self.default_sound) {
                CueChoice::Play(cue) => {
                    if let Err(e) = channels.play_cue(recipient, &cue, self.volume, self.pitch) {
                        log::error!("Failed to play mention sound {} for {}: {}", cue, recipient, e);
                    }
                }
                CueChoice::Silent => {}
            }
        }
    }
}

// Mention resolution and notification.
//
// Architecture:
// - scanner.rs: finds mentioned players in a chat line and rewrites it
// - format.rs: picks the marker text a mention is rewritten into
// - policy.rs: decides whether a mentioned player gets notified
// - dispatch.rs: fans a notification out to chat / status line / sound
// - engine.rs: entry points used by the host (chat, join/leave, commands)

pub mod dispatch;
pub mod engine;
pub mod format;
pub mod policy;
pub mod scanner;

pub use engine::MentionEngine;

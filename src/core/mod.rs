pub mod cache;
pub mod clock;
pub mod combat;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod mentions;
pub mod model;
pub mod sound;
pub mod store;

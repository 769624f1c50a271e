#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod core;

pub mod app;
pub use app::run;
pub use crate::core::mentions::MentionEngine;

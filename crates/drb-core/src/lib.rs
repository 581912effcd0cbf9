//! Core domain + application logic for the DeepSeek relay bot.
//!
//! This crate is framework-agnostic. Telegram and the HTTP completion API live
//! behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod completion;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod inbound;
pub mod logging;
pub mod messaging;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};

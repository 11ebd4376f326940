//! Configuration management for the lottery client
//!
//! This module handles loading and managing configuration settings
//! for the transport, the purchase workflow, and the CLI.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{NetworkSettings, Settings};

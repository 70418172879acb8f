//! Command-line driver for draftsafe auto-save stores.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod render;
pub mod settings;

//! Claude Runner - Supervised Claude Code invocations with retries.

pub mod cli;
pub mod config;
pub mod display;
pub mod logging;
pub mod supervisor;

//! CLI command implementations.

pub mod categorize;
mod common;
pub mod config;
pub mod decks;
pub mod models;
pub mod run;

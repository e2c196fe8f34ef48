//! Core domain + application logic for the virtual DM bot refresher.
//!
//! This crate is intentionally transport-agnostic. The source (tweet harvesting)
//! and learning (bot study) services live behind ports implemented in adapter crates.

pub mod config;
pub mod corpus;
pub mod cycle;
pub mod domain;
pub mod errors;
pub mod harvest;
pub mod logging;
pub mod ports;
pub mod provision;
pub mod registry;
pub mod scheduler;
pub mod status;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};

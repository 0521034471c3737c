//! # Sounder Common
//!
//! Shared models and configuration for the probing workspace.
//!
//! * **[`network`]**: targets and the input formats that expand into them.
//! * **[`outcome`]**: what a probe reports back for one target.
//! * **[`config`]**: per-call configuration for the pool and each probe strategy.
//! * **[`error`]**: configuration and pool errors surfaced to callers.

pub mod config;
pub mod error;
pub mod network;
pub mod outcome;
pub mod utils;

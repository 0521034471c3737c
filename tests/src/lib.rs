//! Cross-crate tests for the probing pool.

#![cfg(test)]

mod pool;
mod resolve;
mod utils;

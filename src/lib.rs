//! ORDERMON — order verification polling daemon.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod engine;
pub mod store;
pub mod types;
pub mod verifier;

//! AstroLab: local-first favorites, remote sync and a reflections journal
//! for an astrology reference app.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod clock;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

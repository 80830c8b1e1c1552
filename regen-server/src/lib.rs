//! RegenThemFund relay server and command-line tools.
//!
//! The `regen-relay` binary serves the event relay over WebSocket; the
//! `get-funds`, `monitor-funds` and `watch-funds` binaries read fund state
//! straight from the chain.

pub mod api;
pub mod cli;
pub mod config;
pub mod report;
pub mod server;
pub mod shutdown;
pub mod state;

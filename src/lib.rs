//! Hourly energy and token settlement simulator for a renewable-energy cooperative.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod io;
pub mod ledger;
pub mod runner;
/// Settlement engine, decision providers, history, and logs.
pub mod sim;
pub mod storage;

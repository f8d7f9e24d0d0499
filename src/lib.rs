//! AQI Proxy Library
//!
//! This module exposes the cache, provider client, lookup service and HTTP
//! router for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod server;
pub mod service;

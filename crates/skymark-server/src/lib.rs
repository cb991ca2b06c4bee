//! Skymark server library - HTTP API for the study-abroad advisor.
//!
//! This library provides the HTTP routes, configuration and application state
//! for the Skymark server. It's separated from main.rs to enable integration testing.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;

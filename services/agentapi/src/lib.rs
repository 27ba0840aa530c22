//! Agent service library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, configuration, observability, and device
//! storage for use by the binary and tests.
pub mod api;
pub mod app;
pub mod config;
pub mod observability;
pub mod store;

//! Agent service HTTP API module.
pub mod agents;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;

//! # Survey Common Library
//!
//! Shared code for the survey classifier tooling including:
//! - Error types
//! - Configuration loading (TOML + environment)
//! - Model registry records and project filtering

pub mod config;
pub mod error;
pub mod registry;

pub use error::{Error, Result};
pub use registry::{ModelId, ModelRecord, ModelRegistry};

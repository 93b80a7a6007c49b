//! # EcoFarm Common Library
//!
//! Shared code for the EcoFarm service crates:
//! - Error taxonomy
//! - Bootstrap configuration (TOML, environment, root folder)
//! - Database schema, models and farm-scoped queries

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

//! Shared utilities for profile-relay
//!
//! This crate provides common functionality used across the profile-relay
//! workspace: tracing setup and `.env` loading.

pub mod env;
pub mod logging;

pub use env::load_dotenv;
pub use logging::{LogFormat, LoggingConfig, init_tracing};

//! Server module for wagate
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Production configuration validation
//! - `init`: Service wiring and the main run loop

pub mod config;
mod init;
pub mod loader;
mod validation;

pub use init::{build_router, build_state, migrate, run};

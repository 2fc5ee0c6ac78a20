//! Middleware module for the wagate HTTP server
//!
//! Provides the `X-Client-Id` tenant extractor.

pub mod tenant;

pub use tenant::CurrentTenant;

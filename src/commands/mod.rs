//! Command implementations for the CLI
//!
//! - estimate: price a quantities file and print the cost breakdown
//! - config: configuration display and validation

pub mod config;
pub mod estimate;

//! Common infrastructure for the taskfan workspace
//!
//! This crate provides shared functionality used across the taskfan crates:
//! - Error handling with context propagation
//! - Structured logging setup and helpers

pub mod error;

pub use error::*;

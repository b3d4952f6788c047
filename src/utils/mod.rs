//! Shared utilities
//!
//! This module provides process-level helpers shared by the binaries, such as
//! logging setup.

pub mod logging;

pub use logging::init_tracing;

//! Vetra Core
//!
//! Ambient utilities shared by the Vetra engine crates: logging setup and
//! CPU profiling scopes.

pub mod logging;
pub mod profiling;

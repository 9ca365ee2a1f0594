//! Loam compiler driver library.
//!
//! The binary in `main.rs` is a thin argument-parsing shell around
//! [`commands`]; keeping the work here makes the driver testable
//! without spawning processes.

pub mod commands;

pub use commands::CompileError;

//! Flashpack - packaging pipeline for flashable Android installer archives
//!
//! This library turns compiled native binaries, application packages and
//! install scripts into signed recovery-flashable zip archives.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (packing, compression, archive assembly)
//! - [`infra`] - Infrastructure layer (filesystem, processes, downloads)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

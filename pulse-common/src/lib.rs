//! Common types and utilities shared across Community Pulse crates.
//!
//! This crate holds the observability bootstrap and the error type used by the
//! snapshot layer. It is intentionally small so that every crate
//! in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`PulseError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use pulse_common::PulseError;
//! use std::io::{Error, ErrorKind};
//!
//! let err = PulseError::io("out/leaderboard.json", Error::new(ErrorKind::Other, "disk full"));
//! assert_eq!(err.to_string(), "I/O error on out/leaderboard.json: disk full");
//! ```
use std::path::PathBuf;

pub mod observability;

/// Error types used across the Community Pulse system.
#[derive(thiserror::Error, Debug)]
pub enum PulseError {
    /// Reading or writing a snapshot file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be encoded or decoded as JSON.
    #[error("JSON error on {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PulseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Convenient alias for results that use [`PulseError`].
pub type Result<T> = std::result::Result<T, PulseError>;

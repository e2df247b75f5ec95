//! Centralized error handling for the catalog
//!
//! Every fallible operation in the crate returns one of the error types
//! defined in [`types`]. Failures are grouped by the layer that produced them:
//!
//! - **Source Errors**: playlist/guide fetching, format resolution and parsing
//! - **Probe Errors**: per-channel reachability checks (never fatal)
//! - **Playback Errors**: media sink failures
//! - **Storage Errors**: the persisted key/value state
//!
//! Ingestion entry points on [`crate::app::AppState`] catch these at the
//! boundary and turn them into user-facing notifications.
//!
//! # Usage
//!
//! ```rust
//! use iptv_catalog::errors::{AppResult, SourceError};
//!
//! fn resolve(name: &str) -> AppResult<()> {
//!     if !name.ends_with(".m3u") {
//!         return Err(SourceError::unsupported_format(name).into());
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Storage Results
pub type StorageResult<T> = Result<T, StorageError>;

//! Hub module
//!
//! Remote dataset-repository persistence for uploads, cleaned snapshots,
//! and model artifacts.

pub mod client;

pub use client::{HubClient, HubCommit};

use thiserror::Error;

/// Errors raised by the dataset hub client
#[derive(Error, Debug)]
pub enum HubError {
    /// The HTTP request could not be sent or read
    #[error("request to hub failed: {0}")]
    Request(String),

    /// The hub answered with a non-success status
    #[error("hub returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, when readable
        body: String,
    },

    /// The requested file does not exist in the repository
    #[error("file not found in hub: {0}")]
    NotFound(String),

    /// The hub response body could not be parsed
    #[error("hub response could not be parsed: {0}")]
    Parse(String),
}

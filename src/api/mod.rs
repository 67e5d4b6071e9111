//! API module
//!
//! Contains HTTP request handlers for the upload, cleaning, and training
//! endpoints.

pub mod cleaning;
pub mod datasets;
pub mod training;
pub mod upload;

use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state threaded through every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Upper bound on uploaded dataset size (bytes)
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// State management module
// Handles the session registry shared across request handlers

pub mod app_state;

pub use app_state::{AppState, SessionId};

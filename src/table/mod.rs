//! Table module
//!
//! In-memory tables plus the readers and writers that move them between
//! uploaded bytes, cleaning sessions, and hub files.

pub mod frame;
pub mod read;
pub mod write;

pub use frame::{DataFrame, TableError, Value};
pub use read::{read_table, FileFormat};
pub use write::to_csv_bytes;

//! Local persistence: key-value stores and the cached status record.

pub mod file;
pub mod format;
pub mod store;

//! Wire models for the purchase SDK bridge and the backend.

pub mod models;

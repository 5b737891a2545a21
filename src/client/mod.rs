//! Backend HTTP client.

pub mod http;

//! Purchase SDK seam.

pub mod guard;

//! Entitlement policy.

pub mod reconcile;

//! Paywall presentation: plans, offers, and the locked-card teaser.

pub mod offer;
pub mod teaser;

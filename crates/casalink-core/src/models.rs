//! Domain models for CASALINK.
//!
//! These are the core types shared across all crates.

pub mod contract;
pub mod document;
pub mod notification;
pub mod property;
pub mod user;

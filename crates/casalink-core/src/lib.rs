//! CASALINK Core — domain models, repository traits, and error types.
//!
//! This crate is I/O-free: it defines the rental-contract domain and the
//! abstract persistence surface that `casalink-db` implements and
//! `casalink-contract` orchestrates against.

pub mod error;
pub mod models;
pub mod repository;

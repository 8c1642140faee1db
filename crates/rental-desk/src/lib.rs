//! Client-side police-verification workflow for the rental management platform.
//!
//! The crate models verification records and their review state machine, validates
//! landlord actions before they reach the network, talks to the verification API over
//! HTTP, and keeps a desk of client-held state that is re-fetched after every mutation.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

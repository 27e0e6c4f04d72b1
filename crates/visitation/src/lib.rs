//! Visit-request lifecycle engine for a detention facility.
//!
//! Relatives submit visit requests, reviewing officers approve, reject, or
//! reschedule them, and approved visits receive a single-use entry credential
//! that checkpoints verify against a time window.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

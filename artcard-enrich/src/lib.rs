//! artcard-enrich library interface
//!
//! Discovery pipeline and card maintenance workflows, exposed for the
//! binaries and for integration testing.

pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{EnrichError, EnrichResult};

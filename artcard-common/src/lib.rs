//! # artcard Common Library
//!
//! Shared code for the artcard pipeline and its maintenance utilities:
//! - Error types
//! - Configuration loading and folder/credential resolution
//! - Tracing initialisation
//! - Card filename sanitisation
//! - Front matter parsing and rendering

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod logging;
pub mod naming;

pub use error::{Error, Result};
pub use frontmatter::CardDocument;

//! # Tower Defense Development Tools
//!
//! Command-line tools for development:
//! - Level validators (dimensions, required tiles, routes)
//! - Config validators (RON tunables)
//! - Level format conversion between JSON and RON

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;

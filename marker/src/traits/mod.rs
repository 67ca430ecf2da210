//!
//! Traits Module
//!
//! Core traits used throughout the marker for extensibility.
//!
//! - [`parser`]: the generic trait for turning raw files into typed label data.

pub mod parser;

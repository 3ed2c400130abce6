//! # askdoc-core
//!
//! Core algorithms for askdoc: text chunking, keyword extraction, lexical
//! relevance scoring, and the corpus store abstraction. This crate has no
//! I/O, network, or configuration-file dependencies — the `askdoc`
//! application crate wires these pieces to files and HTTP.

pub mod chunk;
pub mod error;
pub mod keywords;
pub mod models;
pub mod score;
pub mod store;

pub use error::{Error, Result};

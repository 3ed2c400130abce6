//! Document question answering over a local corpus.
//!
//! Pipeline: extract ([`extract`]) -> chunk and store ([`ingest`],
//! [`store_json`]) -> retrieve and answer ([`rag`], [`generation`]).
//! [`server`] exposes the pipeline over HTTP; the binary drives both the
//! server and one-shot CLI commands.

pub mod config;
pub mod extract;
pub mod generation;
pub mod ingest;
pub mod ocr;
pub mod rag;
pub mod server;
pub mod store_json;

//! Subtrans - SubRip Subtitle Translation
//!
//! Parses SRT documents, translates them with a single LLM completion per
//! document (or per window of blocks), reassembles the answer into a valid
//! SRT document and hands it to cloud-storage and webhook collaborators.

pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod languages;
pub mod pipeline;
pub mod reassemble;
pub mod server;
pub mod subtitle;
pub mod translate;

#[cfg(test)]
mod test_support;

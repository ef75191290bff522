//! NIMBUS AI
//!
//! A small multi-agent assistant: a web-search agent and a finance
//! agent combined by a team wrapper, answering queries from a
//! one-page web UI or a one-shot CLI.

pub mod agent;
pub mod config;
pub mod finance;
pub mod inference;
pub mod search;
pub mod server;
pub mod types;

//! Relay between the browser widget and the hosted assistant stack.
//!
//! One streaming endpoint: the widget POSTs its transcript, the relay runs
//! a small tool-calling agent against an OpenAI-compatible completions API
//! plus a hosted knowledge base, and streams the answer back as plain text.

pub mod agent;
pub mod config;
pub mod error;
pub mod http;
pub mod knowledge;
pub mod llm;

//! LLM insight generation.
//!
//! The completion client talks to an OpenAI-compatible endpoint, the agents
//! build prompts from pipe rows, and the parser turns replies into cards.

pub mod agents;
pub mod client;
pub mod parse;

pub use agents::{InsightAgent, InsightGenerator};
pub use client::CompletionClient;

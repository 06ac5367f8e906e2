//! Google Gemini API client.
//!
//! Implements [`CompletionService`](crate::CompletionService) for Gemini
//! models via the Generative Language API, streaming replies over SSE.

mod client;
mod config;
mod session;


pub use client::GeminiClient;
pub use config::{GeminiConfig, CREDENTIAL_ENV_VARS};

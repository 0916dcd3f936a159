//! # tabpilot provider - Gemini
//!
//! Generation backend speaking the Gemini `generateContent` REST protocol.

mod client;
mod provider;
mod types;

pub use client::{GeminiClient, DEFAULT_BASE_URL};
pub use provider::GeminiProvider;
pub use types::*;

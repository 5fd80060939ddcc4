//! HugFusion - merges two photos into one generated image of the pair hugging
//!
//! Validates and encodes the two uploaded photos, sends them with a style
//! instruction to a Gemini image model, and tracks the session through a
//! small reducer-driven state machine.

pub mod ai;
pub mod error;
pub mod models;
pub mod prompts;
pub mod session;
pub mod upload;

pub use error::{Error, Result};

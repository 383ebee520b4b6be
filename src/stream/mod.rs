//! Streaming reconstruction of completion turns.

pub mod processor;

pub use processor::{PartialAssistantMessage, PartialToolCall, StreamProcessor};

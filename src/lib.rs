//! Agentry — agent orchestration over streaming LLM completion APIs.
//!
//! Manages the conversation loop: send history plus tool definitions to a
//! completion provider, reassemble the streamed response into typed events,
//! execute requested tool calls, append results, and repeat until the model
//! signals completion. Supports multi-agent handoffs and confirmation-gated
//! tools.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentry::prelude::*;
//!
//! # async fn example() -> agentry::error::Result<()> {
//! let agent = Arc::new(Agent::openai("Assistant", "gpt-4o", "You are helpful.")?);
//! let mut runner = Runner::new(agent);
//! let _events = runner.run_until_complete("Hello!").await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod prelude;
pub mod runner;
pub mod stream;
pub mod tools;
pub mod transcript;
pub mod types;

//! Core types for agentry.

pub mod events;
pub mod fragment;
pub mod message;
pub mod usage;

pub use events::*;
pub use fragment::*;
pub use message::*;
pub use usage::*;

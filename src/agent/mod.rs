//! Agent configuration and completion adapter.

pub mod agent;

pub use agent::{
    Agent, CompletionPolicy, EventStream, TASK_DONE, TRANSFER_TO_AGENT, TRANSFER_TO_PARENT,
    WAIT_FOR_USER,
};

//! Core types for AgentBridge.

pub mod account;
pub mod email;

pub use account::{AccountKind, PARTITION_KEY};
pub use email::{Email, EmailError};

//! AgentBridge Core - Shared account types.
//!
//! This crate provides the types used across all AgentBridge components:
//! - `auth` - Authentication backend (HTTP API + table store adapter)
//! - `cli` - Command-line tools for provisioning accounts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no table access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated email addresses and account classification

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

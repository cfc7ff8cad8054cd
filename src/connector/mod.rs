//! # Connector Layer
//!
//! External integrations implementing the application interfaces:
//! - the chat-completion HTTP client (non-streaming and streaming)
//! - SMTP email delivery
//! - file-backed prompt/recipients/template sources
//! - environment-sourced configuration

pub mod adapter;
pub mod config;

pub use adapter::*;
pub use config::*;

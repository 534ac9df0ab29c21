//! Sillage is a streaming chat client for OpenAI-compatible completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the request and streamed delta payloads.
//! - [`core`] owns the conversation, decodes `data:` event streams, folds
//!   deltas into the in-progress response and drives rendering into a view.
//! - [`ui`] supplies the Markdown, highlighting and math collaborators plus
//!   the HTML and console views.
//! - [`commands`] parses and runs slash commands typed into the chat.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;

//! BlinderFit is a command-line client for the BlinderFit fitness backend and
//! its FitMentor AI assistant.
//!
//! The crate is organized in a few layers:
//! - [`api`] wraps the backend's HTTP endpoints: chat, streaming chat,
//!   history, and health, with uniform [`api::AiError`] failures.
//! - [`core`] holds configuration, credentials, base-URL resolution, and the
//!   [`core::request::AiRequestHook`] that tracks loading and error state
//!   around assistant calls.
//! - [`cli`] parses arguments and renders answers in the terminal.
//! - [`utils`] contains the transcript log and test helpers.
//!
//! The binary (`src/main.rs`) only calls [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;

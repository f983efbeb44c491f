//! deployd Library
//!
//! Core modules for the webhook-driven deployment daemon.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod runner;
pub mod server;
pub mod settings;
pub mod utils;
pub mod webhook;
pub mod workers;

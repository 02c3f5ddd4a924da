//! # TaskFlow Server Library
//!
//! Process-level wiring for the TaskFlow store: configuration loading, the
//! shared application state, demo data and the live event logger.
//!
//! ## Modules
//!
//! - `app`: Shared application state and session helpers
//! - `config`: Layered configuration (file, environment, `.env`)
//! - `live`: Broadcaster subscriptions that log published events
//! - `seed`: Demo workspace used when the server starts empty

pub mod app;
pub mod config;
pub mod live;
pub mod seed;

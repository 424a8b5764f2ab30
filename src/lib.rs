//! Karo - alert reaction engine
//!
//! Matches incoming monitoring alerts against declarative reaction rules and
//! synthesizes one isolated job per matched action, with environment values
//! pulled from the alert and from config/secret stores.

pub mod alert;
pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod env;
pub mod job;
pub mod logging;
pub mod metrics;
pub mod reactor;
pub mod rules;
pub mod sanitize;

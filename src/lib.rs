//! Relay - resilient request dispatcher for LLM inference backends
//!
//! This library classifies incoming completion requests, routes them across
//! interchangeable inference backends behind per-endpoint circuit breakers,
//! and degrades through a response cache and a static message when every
//! backend is unavailable.

pub mod api;
pub mod breaker;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod fallback;
pub mod health;
pub mod metrics;
pub mod upstream;

//! Tollgate - Per-client Sliding-Window Rate Limiting
//!
//! This crate implements a sliding-window log rate limiter keyed by an opaque,
//! hashed client identity, and an HTTP service that puts it in front of its
//! endpoints. Clients over their quota receive a 429 carrying the time until
//! their oldest counted request leaves the window.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;

//! Library surface of the pay402 facilitator server.
//!
//! The binary in `main.rs` wires [`config`], [`handlers`], and the engines
//! from `pay402-evm` into an HTTP service.

pub mod config;
pub mod error;
pub mod handlers;

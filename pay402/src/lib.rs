//! Core types for the pay402 payment protocol.
//!
//! This crate provides the chain-agnostic building blocks for pay-per-request
//! payment flows over HTTP 402 Payment Required. A server advertises one or
//! more acceptable payment assets for a protected resource, a client signs an
//! off-chain transfer authorization for one of them, and a facilitator
//! verifies and settles that authorization on-chain.
//!
//! Chain-specific signing, verification, and settlement live in companion
//! crates (`pay402-evm` for EIP-155 networks).
//!
//! # Modules
//!
//! - [`encoding`] - Base64 payment header encoding
//! - [`error`] - Protocol error taxonomy and wire reason codes
//! - [`networks`] - Registry of known networks and their reference stable assets
//! - [`price`] - Price specifications and payment requirements generation
//! - [`proto`] - Wire format types (402 body, verify/settle messages)
//! - [`replay`] - Replay ledger abstraction guarding against authorization reuse
//! - [`select`] - Client-side selection of one requirement from an offer
//! - [`timestamp`] - Unix timestamps for authorization validity windows

pub mod encoding;
pub mod error;
pub mod networks;
pub mod price;
pub mod proto;
pub mod replay;
pub mod select;
pub mod timestamp;

//! EIP-155 (EVM) chain support for the pay402 payment protocol.
//!
//! Implements the "exact" payment scheme over ERC-3009
//! `transferWithAuthorization`: clients sign an EIP-712 transfer
//! authorization off-chain ([`signer`]), and a facilitator verifies the
//! signature and replay state locally ([`verify`]), submits the transfer
//! on-chain ([`settle`]), and optionally rebates part of the settled amount
//! ([`cashback`]).
//!
//! The on-chain boundary is the [`provider::SettlementProvider`] trait; the
//! shipped implementation speaks JSON-RPC over HTTP through `alloy`.

pub mod cashback;
pub mod facilitator;
pub mod provider;
pub mod settle;
pub mod signer;
pub mod types;
pub mod verify;

pub use cashback::{CashbackEngine, CashbackPolicy};
pub use facilitator::{ExactEvmFacilitator, supported_kinds};
pub use provider::{HttpSettlementProvider, SettlementProvider};
pub use settle::Settler;
pub use signer::{TypedDataSigner, build_payment_payload, sign_transfer_authorization};
pub use types::{Eip3009Authorization, ExactPayload, SignatureParts, TokenAmount};
pub use verify::{Verifier, VerifyMode};

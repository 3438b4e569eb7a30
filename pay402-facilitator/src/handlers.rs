//! Axum route handlers for the facilitator service.
//!
//! Exposes the facilitator HTTP API: `POST /verify` (dry-run check),
//! `POST /settle` (verify-and-settle), and `GET /supported` (capability
//! advertisement). Requests are routed to the per-network engine by the
//! payload's `network` field.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use pay402::proto::{
    SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse,
};
use pay402_evm::{ExactPayload, ExactEvmFacilitator, supported_kinds};

use crate::error::FacilitatorError;

/// Per-network engines plus the advertisement data derived from them.
pub struct AppState {
    engines: HashMap<String, ExactEvmFacilitator>,
    signers: Vec<(String, Address)>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("networks", &self.signers.len())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates the shared state from per-network engines and their signer
    /// addresses.
    #[must_use]
    pub fn new(
        engines: HashMap<String, ExactEvmFacilitator>,
        signers: Vec<(String, Address)>,
    ) -> Self {
        Self { engines, signers }
    }

    fn engine(&self, network: &str) -> Result<&ExactEvmFacilitator, FacilitatorError> {
        self.engines
            .get(network)
            .ok_or_else(|| FacilitatorError::UnsupportedNetwork(network.to_owned()))
    }
}

/// Shared application state for the facilitator service.
pub type FacilitatorState = Arc<AppState>;

/// `GET /supported` — Returns the list of supported payment kinds.
pub async fn get_supported(State(state): State<FacilitatorState>) -> Json<SupportedResponse> {
    Json(supported_kinds(&state.signers))
}

/// `POST /verify` — Dry-run verification of a payment payload. Does not
/// consume the payload's nonce slot.
///
/// # Errors
///
/// Returns 400 on a malformed body, or 404 if no engine is configured for
/// the payload's network.
pub async fn post_verify(
    State(state): State<FacilitatorState>,
    body: Result<Json<VerifyRequest<ExactPayload>>, JsonRejection>,
) -> Result<Json<VerifyResponse>, FacilitatorError> {
    let Json(body) = body?;
    let engine = state.engine(&body.payment_payload.network)?;
    Ok(Json(engine.verify(&body).await))
}

/// `POST /settle` — Verifies with a replay reservation and settles on-chain.
///
/// # Errors
///
/// Returns 400 on a malformed body, or 404 if no engine is configured for
/// the payload's network.
pub async fn post_settle(
    State(state): State<FacilitatorState>,
    body: Result<Json<SettleRequest<ExactPayload>>, JsonRejection>,
) -> Result<Json<SettleResponse>, FacilitatorError> {
    let Json(body) = body?;
    let engine = state.engine(&body.payment_payload.network)?;
    Ok(Json(engine.settle(&body).await))
}

/// Creates an Axum [`axum::Router`] with all facilitator endpoints.
pub fn facilitator_router(state: FacilitatorState) -> axum::Router {
    axum::Router::new()
        .route("/supported", axum::routing::get(get_supported))
        .route("/verify", axum::routing::post(post_verify))
        .route("/settle", axum::routing::post(post_settle))
        .with_state(state)
}

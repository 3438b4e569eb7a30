//! Base64 payment header encoding.
//!
//! A signed [`PaymentPayload`](crate::proto::PaymentPayload) travels from the
//! client to the resource server in the `X-PAYMENT` request header as
//! standard-alphabet base64 over its JSON serialization. This module provides
//! the encode/decode pair for that header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::proto::PaymentPayload;

/// Failure decoding an `X-PAYMENT` header value.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HeaderDecodeError {
    /// The header value is not valid base64.
    #[error("invalid base64 in payment header: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not a valid JSON payment payload.
    #[error("invalid payment payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes a payment payload into an `X-PAYMENT` header value.
///
/// # Errors
///
/// Returns a JSON serialization error if the payload cannot be serialized.
pub fn encode_payment_header<T: Serialize>(
    payload: &PaymentPayload<T>,
) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(payload)?;
    Ok(b64.encode(json))
}

/// Decodes an `X-PAYMENT` header value back into a payment payload.
///
/// # Errors
///
/// Returns [`HeaderDecodeError`] if the value is not base64 or the decoded
/// bytes are not a valid payload.
pub fn decode_payment_header<T: DeserializeOwned>(
    header: &str,
) -> Result<PaymentPayload<T>, HeaderDecodeError> {
    let bytes = b64.decode(header.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{EXACT_SCHEME, X402_VERSION};

    #[test]
    fn header_roundtrips_a_payload() {
        let payload = PaymentPayload {
            x402_version: X402_VERSION,
            scheme: EXACT_SCHEME.to_owned(),
            network: "base-sepolia".to_owned(),
            payload: serde_json::json!({"signature": "0xdeadbeef"}),
        };
        let header = encode_payment_header(&payload).unwrap();
        let decoded: PaymentPayload = decode_payment_header(&header).unwrap();
        assert_eq!(decoded.scheme, "exact");
        assert_eq!(decoded.network, "base-sepolia");
        assert_eq!(decoded.payload["signature"], "0xdeadbeef");
    }

    #[test]
    fn garbage_header_is_rejected() {
        assert!(matches!(
            decode_payment_header::<serde_json::Value>("%%not-base64%%"),
            Err(HeaderDecodeError::Base64(_))
        ));
        // Valid base64, invalid JSON.
        let header = base64::engine::general_purpose::STANDARD.encode(b"hello");
        assert!(matches!(
            decode_payment_header::<serde_json::Value>(&header),
            Err(HeaderDecodeError::Json(_))
        ));
    }
}

//! Wire and typed-data types for the EVM "exact" payment scheme.
//!
//! The scheme settles payments through ERC-3009 `transferWithAuthorization`:
//! a client signs an EIP-712 [`TransferWithAuthorization`] struct off-chain
//! and the facilitator submits it on-chain on the client's behalf.

use alloy_primitives::{Address, B256, Bytes, Signature, U256};
use alloy_sol_types::sol;
use pay402::timestamp::UnixTimestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A token amount in the asset's smallest unit.
///
/// Serialized as a decimal string to avoid precision loss in JSON consumers
/// without 256-bit integer support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(pub U256);

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TokenAmount {
    type Err = alloy_primitives::ruint::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(U256::from_str_radix(s, 10)?))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom("token amount must be a decimal integer"))
    }
}

/// The structured transfer authorization a client signs.
///
/// Fields mirror the EIP-712 `TransferWithAuthorization` message; the
/// facilitator reconstructs the typed-data struct from this record to verify
/// the signature, so the serialized values must match what was signed
/// exactly.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Authorization {
    /// The address authorizing the transfer (token owner).
    pub from: Address,
    /// The recipient address for the transfer.
    pub to: Address,
    /// The amount to transfer, in the token's smallest unit.
    pub value: TokenAmount,
    /// The authorization is not valid before this timestamp (inclusive).
    pub valid_after: UnixTimestamp,
    /// The authorization expires at this timestamp (exclusive).
    pub valid_before: UnixTimestamp,
    /// A unique 32-byte nonce preventing authorization reuse.
    pub nonce: B256,
}

/// Signed payload for the EVM exact scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactPayload {
    /// 65-byte EIP-712 signature over the authorization.
    pub signature: Bytes,
    /// The structured authorization data that was signed.
    pub authorization: Eip3009Authorization,
}

/// A 65-byte signature decomposed into its recovery components.
///
/// `v` is normalized to the 27/28 convention expected by ERC-3009 token
/// contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParts {
    /// First 32 bytes of the signature.
    pub r: B256,
    /// Next 32 bytes of the signature.
    pub s: B256,
    /// Recovery byte, normalized to 27 or 28.
    pub v: u8,
}

impl From<&Signature> for SignatureParts {
    fn from(signature: &Signature) -> Self {
        Self {
            r: B256::from(signature.r()),
            s: B256::from(signature.s()),
            v: 27 + u8::from(signature.v()),
        }
    }
}

sol!(
    /// EIP-712 struct for ERC-3009 `transferWithAuthorization`.
    ///
    /// Field names and order must match the on-chain definition: the typed
    /// data hash is derived from this exact schema.
    #[derive(Serialize, Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

impl From<&Eip3009Authorization> for TransferWithAuthorization {
    fn from(authorization: &Eip3009Authorization) -> Self {
        Self {
            from: authorization.from,
            to: authorization.to,
            value: authorization.value.into(),
            validAfter: U256::from(authorization.valid_after.as_secs()),
            validBefore: U256::from(authorization.valid_before.as_secs()),
            nonce: authorization.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn token_amount_serializes_as_decimal_string() {
        let amount = TokenAmount(U256::from(10_000u64));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"10000\"");
        let back: TokenAmount = serde_json::from_str("\"10000\"").unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn token_amount_rejects_hex_and_garbage() {
        assert!(serde_json::from_str::<TokenAmount>("\"0x10\"").is_err());
        assert!(serde_json::from_str::<TokenAmount>("\"ten\"").is_err());
    }

    #[test]
    fn authorization_uses_camel_case_fields() {
        let authorization = Eip3009Authorization {
            from: address!("209693Bc6afc0C5328bA36FaF03C514EF312287C"),
            to: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            value: TokenAmount(U256::from(10_000u64)),
            valid_after: UnixTimestamp::from_secs(100),
            valid_before: UnixTimestamp::from_secs(200),
            nonce: B256::repeat_byte(7),
        };
        let json = serde_json::to_value(authorization).unwrap();
        assert_eq!(json["validAfter"], "100");
        assert_eq!(json["validBefore"], "200");
        assert_eq!(json["value"], "10000");
    }
}

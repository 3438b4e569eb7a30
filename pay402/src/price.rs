//! Price specifications and payment requirements generation.
//!
//! A seller prices a resource either in a fiat-denominated currency string
//! (`"$0.01"`), resolved against the network's reference stable asset, or as
//! an exact atomic amount of a specific token. A [`RequirementsGenerator`]
//! turns a non-empty list of such prices into the `accepts` array of a 402
//! response, preserving order so the first entry stays the seller's default.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::ConfigurationError;
use crate::networks::{self, AssetDescriptor};
use crate::proto::{EXACT_SCHEME, PaymentRequirements, RequirementsExtra};
use alloy_primitives::Address;

/// One way a resource can be priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Price {
    /// A currency-denominated amount such as `"$0.01"`, resolved against the
    /// network's reference stable asset at generation time.
    Money(String),
    /// An exact amount in a specific token's smallest unit.
    Token {
        /// The amount as a non-negative integer literal in atomic units.
        amount: String,
        /// The token the amount is denominated in.
        asset: AssetDescriptor,
    },
}

impl Price {
    /// Convenience constructor for a currency-denominated price.
    #[must_use]
    pub fn money<S: Into<String>>(amount: S) -> Self {
        Self::Money(amount.into())
    }

    /// Convenience constructor for a token-denominated price.
    #[must_use]
    pub fn token<S: Into<String>>(amount: S, asset: AssetDescriptor) -> Self {
        Self::Token {
            amount: amount.into(),
            asset,
        }
    }
}

/// Generates payment requirements for a protected resource.
///
/// Fixed fields (`network`, `pay_to`, `resource`, timeout) are shared by every
/// generated requirement; only the asset and amount vary per price option.
#[derive(Debug, Clone)]
pub struct RequirementsGenerator {
    /// The network payments settle on.
    pub network: String,
    /// The payee address.
    pub pay_to: Address,
    /// The protected resource URL.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// Maximum client think-time in seconds.
    pub max_timeout_seconds: u64,
}

/// Default client think-time before an offer lapses.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 60;

impl RequirementsGenerator {
    /// Creates a generator with the default timeout and empty description.
    #[must_use]
    pub fn new<N, R>(network: N, pay_to: Address, resource: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Self {
            network: network.into(),
            pay_to,
            resource: resource.into(),
            description: String::new(),
            mime_type: "application/json".to_owned(),
            max_timeout_seconds: DEFAULT_MAX_TIMEOUT_SECONDS,
        }
    }

    /// Sets the human-readable resource description.
    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the resource MIME type.
    #[must_use]
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Sets the maximum client think-time in seconds.
    #[must_use]
    pub const fn with_max_timeout_seconds(mut self, secs: u64) -> Self {
        self.max_timeout_seconds = secs;
        self
    }

    /// Generates one requirement per price option, in input order.
    ///
    /// # Errors
    ///
    /// Rejects an empty price list, malformed amounts, and currency prices on
    /// a network with no known reference stable asset. Generation is
    /// all-or-nothing: one bad option fails the whole specification.
    pub fn generate(
        &self,
        prices: &[Price],
    ) -> Result<Vec<PaymentRequirements>, ConfigurationError> {
        if prices.is_empty() {
            return Err(ConfigurationError::EmptyPriceSpec);
        }
        prices.iter().map(|price| self.requirement(price)).collect()
    }

    fn requirement(&self, price: &Price) -> Result<PaymentRequirements, ConfigurationError> {
        let (amount, asset) = match price {
            Price::Money(money) => {
                let asset = networks::reference_asset(&self.network)
                    .ok_or_else(|| ConfigurationError::UnknownReferenceAsset(self.network.clone()))?;
                (money_to_atomic(money, asset.decimals)?, asset)
            }
            Price::Token { amount, asset } => {
                (validate_atomic(amount)?, asset.clone())
            }
        };
        Ok(PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: self.network.clone(),
            max_amount_required: amount,
            resource: self.resource.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            pay_to: self.pay_to,
            max_timeout_seconds: self.max_timeout_seconds,
            asset: asset.address,
            extra: Some(RequirementsExtra {
                name: asset.name,
                version: asset.version,
            }),
        })
    }
}

/// Converts a currency string like `"$0.01"` to an atomic amount string at
/// the given decimal precision, truncating sub-atomic precision.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidMoneyAmount`] if the string is not a
/// non-negative decimal number (an optional leading `$` is stripped).
pub fn money_to_atomic(money: &str, decimals: u8) -> Result<String, ConfigurationError> {
    let bad = || ConfigurationError::InvalidMoneyAmount(money.to_owned());
    let raw = money.trim().strip_prefix('$').unwrap_or_else(|| money.trim());
    let value: Decimal = raw.parse().map_err(|_| bad())?;
    if value.is_sign_negative() {
        return Err(bad());
    }
    let scale = 10u64.checked_pow(u32::from(decimals)).ok_or_else(bad)?;
    let atomic = value
        .checked_mul(Decimal::from(scale))
        .ok_or_else(bad)?
        .trunc();
    let atomic = atomic.to_u128().ok_or_else(bad)?;
    Ok(atomic.to_string())
}

fn validate_atomic(amount: &str) -> Result<String, ConfigurationError> {
    amount
        .parse::<u128>()
        .map(|v| v.to_string())
        .map_err(|_| ConfigurationError::InvalidAtomicAmount(amount.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn generator() -> RequirementsGenerator {
        RequirementsGenerator::new(
            "base-sepolia",
            address!("209693Bc6afc0C5328bA36FaF03C514EF312287C"),
            "https://api.example.com/weather",
        )
        .with_description("Weather data")
    }

    #[test]
    fn one_cent_becomes_ten_thousand_atomic_units() {
        assert_eq!(money_to_atomic("$0.01", 6).unwrap(), "10000");
        assert_eq!(money_to_atomic("0.01", 6).unwrap(), "10000");
        assert_eq!(money_to_atomic("$1", 6).unwrap(), "1000000");
    }

    #[test]
    fn sub_atomic_precision_truncates() {
        // 0.0000019 USDC is 1.9 atomic units; never round up a charge.
        assert_eq!(money_to_atomic("$0.0000019", 6).unwrap(), "1");
    }

    #[test]
    fn negative_and_garbage_money_rejected() {
        assert!(money_to_atomic("$-0.01", 6).is_err());
        assert!(money_to_atomic("one dollar", 6).is_err());
        assert!(money_to_atomic("", 6).is_err());
    }

    #[test]
    fn money_price_resolves_to_reference_asset() {
        let reqs = generator().generate(&[Price::money("$0.01")]).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].max_amount_required, "10000");
        assert_eq!(
            reqs[0].asset,
            address!("036CbD53842c5426634e7929541eC2318f3dCF7e")
        );
        assert_eq!(reqs[0].extra.as_ref().unwrap().name, "USD Coin");
    }

    #[test]
    fn mixed_price_spec_preserves_order() {
        let custom = AssetDescriptor {
            address: address!("1111111111111111111111111111111111111111"),
            decimals: 18,
            name: "Example Token".to_owned(),
            version: "1".to_owned(),
        };
        let reqs = generator()
            .generate(&[
                Price::money("$0.05"),
                Price::token("250000000000000000", custom.clone()),
            ])
            .unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].max_amount_required, "50000");
        assert_eq!(reqs[1].max_amount_required, "250000000000000000");
        assert_eq!(reqs[1].asset, custom.address);
        assert_eq!(reqs[1].extra.as_ref().unwrap().name, "Example Token");
        // Shared fields are identical across the offer.
        assert_eq!(reqs[0].pay_to, reqs[1].pay_to);
        assert_eq!(reqs[0].network, reqs[1].network);
    }

    #[test]
    fn empty_spec_is_rejected() {
        assert!(matches!(
            generator().generate(&[]),
            Err(ConfigurationError::EmptyPriceSpec)
        ));
    }

    #[test]
    fn one_bad_option_fails_the_whole_spec() {
        let result = generator().generate(&[
            Price::money("$0.01"),
            Price::money("not-a-number"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn atomic_amounts_must_be_integer_literals() {
        let asset = networks::reference_asset("base").unwrap();
        let result = generator().generate(&[Price::token("1.5", asset)]);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidAtomicAmount(_))
        ));
    }

    #[test]
    fn currency_price_on_unknown_network_is_rejected() {
        let generator = RequirementsGenerator::new(
            "testnet-of-nowhere",
            address!("209693Bc6afc0C5328bA36FaF03C514EF312287C"),
            "https://api.example.com/weather",
        );
        assert!(matches!(
            generator.generate(&[Price::money("$0.01")]),
            Err(ConfigurationError::UnknownReferenceAsset(_))
        ));
    }
}

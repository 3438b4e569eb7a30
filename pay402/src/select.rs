//! Client-side selection of one payment requirement from an offered list.
//!
//! The default policy filters by network/scheme, then prefers the entry whose
//! asset is the network's reference stable asset, and otherwise takes the
//! first remaining entry (the seller's declared default). A caller-supplied
//! selection function overrides the preference step; a selection that is not
//! one of the filtered candidates is rejected and the first-entry fallback
//! applies.

use crate::error::NoMatchingRequirementsError;
use crate::networks;
use crate::proto::PaymentRequirements;

/// A caller-supplied selection function. Receives the filtered candidates and
/// returns the chosen entry, or `None` to defer to the default policy.
pub type SelectorFn =
    dyn Fn(&[PaymentRequirements]) -> Option<PaymentRequirements> + Send + Sync;

/// Picks exactly one [`PaymentRequirements`] from a 402 offer.
#[derive(Default)]
pub struct RequirementsSelector {
    network: Option<String>,
    scheme: Option<String>,
    custom: Option<Box<SelectorFn>>,
}

impl std::fmt::Debug for RequirementsSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequirementsSelector")
            .field("network", &self.network)
            .field("scheme", &self.scheme)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl RequirementsSelector {
    /// Creates a selector with no filters and the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts candidates to the given network.
    #[must_use]
    pub fn with_network<S: Into<String>>(mut self, network: S) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Restricts candidates to the given scheme.
    #[must_use]
    pub fn with_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Installs a custom selection function, overriding the default
    /// stable-asset preference. The function sees only the filtered
    /// candidates and must return one of them.
    #[must_use]
    pub fn with_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&[PaymentRequirements]) -> Option<PaymentRequirements> + Send + Sync + 'static,
    {
        self.custom = Some(Box::new(selector));
        self
    }

    /// Selects one requirement from `offered`, in transmitted order.
    ///
    /// # Errors
    ///
    /// Returns [`NoMatchingRequirementsError`] when the filters eliminate
    /// every candidate (or the offer was empty).
    pub fn select(
        &self,
        offered: &[PaymentRequirements],
    ) -> Result<PaymentRequirements, NoMatchingRequirementsError> {
        let candidates: Vec<PaymentRequirements> = offered
            .iter()
            .filter(|req| {
                self.network.as_deref().is_none_or(|n| req.network == n)
                    && self.scheme.as_deref().is_none_or(|s| req.scheme == s)
            })
            .cloned()
            .collect();

        let first = candidates.first().cloned().ok_or_else(|| {
            NoMatchingRequirementsError::new(format!(
                "no candidates left from {} offered requirement(s) after filters",
                offered.len()
            ))
        })?;

        if let Some(custom) = &self.custom {
            // An out-of-candidate-set selection is rejected, not trusted.
            if let Some(chosen) = custom(&candidates) {
                if candidates.contains(&chosen) {
                    return Ok(chosen);
                }
            }
            return Ok(first);
        }

        let preferred = candidates.iter().find(|req| {
            networks::by_name(&req.network).is_some_and(|n| n.stable_address == req.asset)
        });
        Ok(preferred.cloned().unwrap_or(first))
    }
}

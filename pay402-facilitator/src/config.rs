//! Facilitator server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4021
//! settle_timeout_secs = 30
//!
//! [networks.base-sepolia]
//! rpc_url = "https://sepolia.base.org"
//! signer_private_key = "$SIGNER_KEY_BASE_SEPOLIA"
//!
//! [cashback]
//! rate_bps = 100
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `config.toml`)
//! - `HOST` — Override server bind address
//! - `PORT` — Override server port
//! - Network signer keys referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Top-level facilitator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4021`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bound on one settlement round trip, in seconds (default: 30).
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_secs: u64,

    /// Per-network configuration keyed by network name (e.g. `base-sepolia`).
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    /// Optional post-settlement rebate policy; absent means no cashback.
    #[serde(default)]
    pub cashback: Option<CashbackConfig>,
}

/// Per-network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Private key for the facilitator signer (hex, with or without `0x`
    /// prefix). Supports `$VAR` / `${VAR}` environment variable expansion.
    pub signer_private_key: String,
}

/// Rebate policy configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CashbackConfig {
    /// Rebate rate in basis points of the settled amount (100 = 1%).
    pub rate_bps: u32,

    /// Reward token override; unset pays back in the settled asset.
    #[serde(default)]
    pub reward_asset: Option<Address>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    4021
}

fn default_settle_timeout() -> u64 {
    30
}

impl FacilitatorConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// After loading, all string values with `$VAR` / `${VAR}` references are
    /// expanded from the process environment. `HOST` and `PORT` env vars
    /// override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            // No config file: empty TOML, defaults apply
            String::new()
        };

        let expanded = expand_env_vars(&content);
        let mut config: Self = toml::from_str(&expanded)?;

        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment
/// variables. Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next();
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let toml = r#"
            host = "127.0.0.1"
            port = 8080
            settle_timeout_secs = 10

            [networks.base-sepolia]
            rpc_url = "https://sepolia.base.org"
            signer_private_key = "0xabc"

            [cashback]
            rate_bps = 100
        "#;
        let config: FacilitatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.settle_timeout_secs, 10);
        assert_eq!(config.networks["base-sepolia"].rpc_url, "https://sepolia.base.org");
        assert_eq!(config.cashback.unwrap().rate_bps, 100);
    }

    #[test]
    fn defaults_apply_to_an_empty_config() {
        let config: FacilitatorConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 4021);
        assert_eq!(config.settle_timeout_secs, 30);
        assert!(config.networks.is_empty());
        assert!(config.cashback.is_none());
    }

    #[test]
    fn expands_braced_and_bare_variables() {
        // SAFETY: test-scoped env mutation; key is unique to this test.
        unsafe { std::env::set_var("PAY402_TEST_KEY", "0xsecret") };
        assert_eq!(expand_env_vars("key = \"$PAY402_TEST_KEY\""), "key = \"0xsecret\"");
        assert_eq!(
            expand_env_vars("key = \"${PAY402_TEST_KEY}\""),
            "key = \"0xsecret\""
        );
    }

    #[test]
    fn unresolved_variables_are_left_as_is() {
        assert_eq!(
            expand_env_vars("key = \"$PAY402_TEST_UNSET_VAR\""),
            "key = \"$PAY402_TEST_UNSET_VAR\""
        );
        assert_eq!(expand_env_vars("price = \"$\""), "price = \"$\"");
    }
}

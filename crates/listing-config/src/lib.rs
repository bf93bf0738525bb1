//! Configuration loading for the marketplace listing system.
//!
//! Configuration is provided as a TOML file with one table per supported
//! chain. Chain ids are written as string keys (TOML tables do not support
//! numeric keys) and parsed to `u64` during deserialization. Loading
//! validates every field eagerly so that misconfiguration is a startup
//! error, never a runtime fallback.
//!
//! ```toml
//! allowed_durations = [1800, 3600, 86400]
//!
//! [chains.1]
//! rpc_url = "https://eth.llamarpc.com"
//! media_address = "0x..."
//! auction_house_address = "0x..."
//! explorer_url = "https://etherscan.io"
//! currencies = [
//!   { symbol = "MKT", address = "0x...", decimals = 18 },
//! ]
//! ```

use listing_types::{CurrencyEntry, CurrencyTable, TransactionHash};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("Failed to read config file: {0}")]
	Io(#[from] std::io::Error),
	/// The configuration file is not valid TOML or has the wrong shape.
	#[error("Failed to parse config: {0}")]
	Parse(#[from] toml::de::Error),
	/// A field has an invalid value.
	#[error("Invalid value for '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// The requested chain is not configured.
	#[error("Chain {0} is not configured")]
	UnknownChain(u64),
}

/// Configuration for a single supported chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// HTTP RPC endpoint for the chain.
	pub rpc_url: String,
	/// Address of the media (NFT) contract holding listed assets.
	pub media_address: listing_types::Address,
	/// Address of the auction house contract; the approval spender for
	/// auction listings.
	pub auction_house_address: listing_types::Address,
	/// Block explorer base URL. Unconfigured chains get no transaction
	/// links rather than a default explorer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
	/// Currency entries added on top of the built-in wrapped-native table,
	/// notably the platform token for this chain.
	#[serde(default)]
	pub currencies: Vec<CurrencyEntry>,
}

impl ChainConfig {
	/// Returns the explorer link for a transaction, if an explorer is
	/// configured for this chain.
	pub fn tx_url(&self, hash: &TransactionHash) -> Option<String> {
		self.explorer_url
			.as_ref()
			.map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), hash))
	}
}

fn default_allowed_durations() -> Vec<u64> {
	// 30 min, 1 h, 6 h, 12 h, 24 h, 3 d, 7 d
	vec![1800, 3600, 21600, 43200, 86400, 259200, 604800]
}

/// Top-level configuration for the listing system.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Supported chains keyed by chain id.
	#[serde(deserialize_with = "deserialize_chains")]
	pub chains: HashMap<u64, ChainConfig>,
	/// The discrete set of permitted auction durations in seconds.
	#[serde(default = "default_allowed_durations")]
	pub allowed_durations: Vec<u64>,
}

/// Deserializes chain configurations keyed by stringified chain ids.
fn deserialize_chains<'de, D>(deserializer: D) -> Result<HashMap<u64, ChainConfig>, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, ChainConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain id '{}': {}", key, e)))?;
		result.insert(chain_id, value);
	}

	Ok(result)
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path)?;
		Self::from_toml(&raw)
	}

	/// Parses and validates configuration from a TOML string.
	pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.chains.is_empty() {
			return Err(ConfigError::InvalidValue {
				field: "chains".to_string(),
				message: "at least one chain must be configured".to_string(),
			});
		}

		for (chain_id, chain) in &self.chains {
			if chain.rpc_url.is_empty() {
				return Err(ConfigError::InvalidValue {
					field: format!("chains.{}.rpc_url", chain_id),
					message: "must not be empty".to_string(),
				});
			}
		}

		if self.allowed_durations.is_empty() {
			return Err(ConfigError::InvalidValue {
				field: "allowed_durations".to_string(),
				message: "at least one duration must be allowed".to_string(),
			});
		}
		if self.allowed_durations.contains(&0) {
			return Err(ConfigError::InvalidValue {
				field: "allowed_durations".to_string(),
				message: "durations must be positive".to_string(),
			});
		}

		Ok(())
	}

	/// Returns the configuration for a chain, or `UnknownChain`.
	pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig, ConfigError> {
		self.chains
			.get(&chain_id)
			.ok_or(ConfigError::UnknownChain(chain_id))
	}

	/// Builds the process-wide currency table: the built-in wrapped-native
	/// entries plus every configured currency.
	pub fn currency_table(&self) -> CurrencyTable {
		let mut table = CurrencyTable::builtin();
		for (chain_id, chain) in &self.chains {
			for entry in &chain.currencies {
				table.insert(*chain_id, entry.clone());
			}
		}
		table
	}
}

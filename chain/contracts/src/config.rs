//! Deployment wiring
//!
//! Describes a full deployment (settlement asset, market, security tokens)
//! as JSON and builds the live contracts from it. The resulting
//! `Deployment` is the explicit replacement for a shared deployed-address
//! file: callers hold it and hand out the handles they need.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use types::ids::{Address, TokenId};
use types::numeric::Amount;

use crate::errors::ConfigError;
use crate::ledger::{SecurityToken, TokenMetadata};
use crate::market::Market;
use crate::settlement::StableToken;
use crate::token::TokenDirectory;

/// Settlement asset section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    pub address: Address,
    pub name: String,
    pub symbol: String,
}

/// One security token to deploy and list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityTokenConfig {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub related_asset: String,
    /// Human units, e.g. `"254.11"`
    pub reference_price: String,
    pub doc_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Admin of every deployed contract
    pub admin: Address,
    pub market: Address,
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub security_tokens: Vec<SecurityTokenConfig>,
}

impl DeploymentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn check_unique_addresses(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let addresses = [self.market, self.settlement.address]
            .into_iter()
            .chain(self.security_tokens.iter().map(|t| t.address));
        for address in addresses {
            if !seen.insert(address) {
                return Err(ConfigError::DuplicateAddress {
                    address: address.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Live contracts built from a `DeploymentConfig`.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub admin: Address,
    pub settlement: Arc<StableToken>,
    pub market: Arc<Market>,
    security_tokens: HashMap<TokenId, Arc<SecurityToken>>,
}

impl Deployment {
    /// Deploy every contract, whitelist the market on each security token
    /// so it can hold sell escrow, and list each token on the market.
    pub fn from_config(config: &DeploymentConfig) -> Result<Self, ConfigError> {
        config.check_unique_addresses()?;

        let settlement = Arc::new(StableToken::new(
            config.settlement.address,
            config.admin,
            config.settlement.name.clone(),
            config.settlement.symbol.clone(),
        ));

        let mut directory = TokenDirectory::new();
        let mut security_tokens = HashMap::new();
        for entry in &config.security_tokens {
            let reference_price: Amount = entry.reference_price.parse()?;
            let token = Arc::new(SecurityToken::new(
                entry.address,
                config.admin,
                TokenMetadata {
                    name: entry.name.clone(),
                    symbol: entry.symbol.clone(),
                    related_asset: entry.related_asset.clone(),
                    reference_price,
                },
            ));
            directory.insert(token.clone());
            security_tokens.insert(entry.address, token);
        }

        let market = Arc::new(Market::new(
            config.market,
            config.admin,
            settlement.clone(),
            directory,
        ));

        for entry in &config.security_tokens {
            if let Some(token) = security_tokens.get(&entry.address) {
                token.add_to_whitelist(&config.admin, config.market)?;
            }
            market.register_token(
                entry.address,
                &entry.name,
                &entry.symbol,
                &entry.related_asset,
                &entry.doc_uri,
            )?;
        }

        info!(
            market = %config.market,
            settlement = %config.settlement.address,
            tokens = config.security_tokens.len(),
            "Deployment ready"
        );

        Ok(Self {
            admin: config.admin,
            settlement,
            market,
            security_tokens,
        })
    }

    pub fn security_token(&self, address: &TokenId) -> Option<Arc<SecurityToken>> {
        self.security_tokens.get(address).cloned()
    }

    pub fn security_token_addresses(&self) -> Vec<TokenId> {
        let mut addresses: Vec<_> = self.security_tokens.keys().copied().collect();
        addresses.sort();
        addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{LedgerError, MarketError};
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "admin": "0x0000000000000000000000000000000000000001",
        "market": "0x0000000000000000000000000000000000000005",
        "settlement": {
            "address": "0x0000000000000000000000000000000000000014",
            "name": "Tether USD",
            "symbol": "USDT"
        },
        "security_tokens": [
            {
                "address": "0x0000000000000000000000000000000000000064",
                "name": "Tesla Peg Token",
                "symbol": "PTSL",
                "related_asset": "TSLA",
                "reference_price": "254.11",
                "doc_uri": "https://example.com/ptsl.pdf"
            }
        ]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = DeploymentConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.admin, Address::from_low_u64(1));
        assert_eq!(config.settlement.symbol, "USDT");
        assert_eq!(config.security_tokens.len(), 1);
        assert_eq!(config.security_tokens[0].address, Address::from_low_u64(100));
    }

    #[test]
    fn test_malformed_config() {
        let result = DeploymentConfig::from_json_str("{\"admin\": \"0x01\"}");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = DeploymentConfig::from_path(file.path()).unwrap();
        assert_eq!(config.market, Address::from_low_u64(5));
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = DeploymentConfig::from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_deploy_lists_tokens() {
        let config = DeploymentConfig::from_json_str(SAMPLE).unwrap();
        let deployment = Deployment::from_config(&config).unwrap();

        let token_addr = Address::from_low_u64(100);
        let token = deployment.security_token(&token_addr).unwrap();
        assert_eq!(token.metadata().reference_price, "254.11".parse().unwrap());
        assert!(token.is_whitelisted(&config.market));

        let listed = deployment.market.get_registered_tokens();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].active);
        assert_eq!(deployment.market.settlement_asset(), config.settlement.address);
        assert_eq!(deployment.security_token_addresses(), vec![token_addr]);
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let mut config = DeploymentConfig::from_json_str(SAMPLE).unwrap();
        config.security_tokens[0].address = config.settlement.address;
        let result = Deployment::from_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateAddress { .. })));
    }

    #[test]
    fn test_bad_reference_price() {
        let mut config = DeploymentConfig::from_json_str(SAMPLE).unwrap();
        config.security_tokens[0].reference_price = "cheap".to_string();
        let result = Deployment::from_config(&config);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_bad_listing_rejected() {
        let mut config = DeploymentConfig::from_json_str(SAMPLE).unwrap();
        config.security_tokens[0].doc_uri = "not a url".to_string();
        let result = Deployment::from_config(&config);
        assert!(matches!(
            result,
            Err(ConfigError::Market(MarketError::InvalidListing { .. }))
        ));
    }

    #[test]
    fn test_deployment_admin_roles() {
        let config = DeploymentConfig::from_json_str(SAMPLE).unwrap();
        let deployment = Deployment::from_config(&config).unwrap();
        let outsider = Address::from_low_u64(77);

        let result = deployment.settlement.mint(&outsider, outsider, Amount::from_whole(1));
        assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
        deployment
            .settlement
            .mint(&config.admin, outsider, Amount::from_whole(1))
            .unwrap();
    }
}

//! Token registry — the market's catalog of listed security tokens
//!
//! Registrations are kept in insertion order and never deleted; a listing
//! is retired by deactivating it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::TokenId;

use crate::errors::MarketError;

/// One listed security token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistration {
    pub token_address: TokenId,
    pub name: String,
    pub symbol: String,
    /// Real-world instrument reference, e.g. "TSLA"
    pub related_asset: String,
    /// Offering documentation
    pub doc_uri: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    entries: Vec<TokenRegistration>,
    index: HashMap<TokenId, usize>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an active registration. Fails on a duplicate address or
    /// malformed listing fields.
    pub fn register(
        &mut self,
        token_address: TokenId,
        name: &str,
        symbol: &str,
        related_asset: &str,
        doc_uri: &str,
    ) -> Result<&TokenRegistration, MarketError> {
        if self.index.contains_key(&token_address) {
            return Err(MarketError::DuplicateToken {
                token: token_address.to_string(),
            });
        }
        validate_listing(name, symbol, related_asset, doc_uri)?;

        let position = self.entries.len();
        self.entries.push(TokenRegistration {
            token_address,
            name: name.trim().to_string(),
            symbol: symbol.trim().to_string(),
            related_asset: related_asset.trim().to_string(),
            doc_uri: doc_uri.trim().to_string(),
            active: true,
        });
        self.index.insert(token_address, position);
        Ok(&self.entries[position])
    }

    pub fn get(&self, token: &TokenId) -> Option<&TokenRegistration> {
        self.index.get(token).map(|&i| &self.entries[i])
    }

    /// Registration for a token that may currently be traded.
    pub fn require_active(&self, token: &TokenId) -> Result<&TokenRegistration, MarketError> {
        let registration = self.get(token).ok_or_else(|| MarketError::UnknownToken {
            token: token.to_string(),
        })?;
        if !registration.active {
            return Err(MarketError::InactiveToken {
                token: token.to_string(),
            });
        }
        Ok(registration)
    }

    /// Set the active flag. Returns whether it changed.
    pub fn set_active(&mut self, token: &TokenId, active: bool) -> Result<bool, MarketError> {
        let position = *self.index.get(token).ok_or_else(|| MarketError::UnknownToken {
            token: token.to_string(),
        })?;
        let registration = &mut self.entries[position];
        if registration.active == active {
            return Ok(false);
        }
        registration.active = active;
        Ok(true)
    }

    /// All registrations in insertion order, inactive included.
    pub fn all(&self) -> &[TokenRegistration] {
        &self.entries
    }

    pub fn active(&self) -> impl Iterator<Item = &TokenRegistration> + '_ {
        self.entries.iter().filter(|r| r.active)
    }
}

fn validate_listing(name: &str, symbol: &str, related_asset: &str, doc_uri: &str) -> Result<(), MarketError> {
    for (field, value) in [("name", name), ("symbol", symbol), ("related asset", related_asset)] {
        if value.trim().is_empty() {
            return Err(MarketError::InvalidListing {
                reason: format!("{} must not be empty", field),
            });
        }
    }

    let uri = doc_uri.trim();
    let has_host = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(MarketError::InvalidListing {
            reason: format!("documentation URI must be an http(s) URL: '{}'", doc_uri),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Address;

    fn t1() -> TokenId {
        Address::from_low_u64(100)
    }

    fn t2() -> TokenId {
        Address::from_low_u64(101)
    }

    fn register_tesla(registry: &mut TokenRegistry) {
        registry
            .register(t1(), "Tesla Peg Token", "PTSL", "TSLA", "https://example.com/ptsl.pdf")
            .unwrap();
    }

    #[test]
    fn test_register_and_list() {
        let mut registry = TokenRegistry::new();
        register_tesla(&mut registry);

        let all = registry.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "PTSL");
        assert!(all[0].active);
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = TokenRegistry::new();
        register_tesla(&mut registry);
        let result = registry.register(t1(), "Again", "AGN", "AAPL", "https://example.com");
        assert_eq!(
            result,
            Err(MarketError::DuplicateToken {
                token: t1().to_string()
            })
        );
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut registry = TokenRegistry::new();
        register_tesla(&mut registry);
        registry
            .register(t2(), "Apple Peg Token", "PAPL", "AAPL", "http://example.com/papl")
            .unwrap();

        let symbols: Vec<_> = registry.all().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["PTSL", "PAPL"]);
    }

    #[test]
    fn test_require_active() {
        let mut registry = TokenRegistry::new();
        register_tesla(&mut registry);
        assert!(registry.require_active(&t1()).is_ok());

        assert!(matches!(
            registry.require_active(&t2()),
            Err(MarketError::UnknownToken { .. })
        ));

        registry.set_active(&t1(), false).unwrap();
        assert!(matches!(
            registry.require_active(&t1()),
            Err(MarketError::InactiveToken { .. })
        ));
    }

    #[test]
    fn test_deactivated_token_still_listed() {
        let mut registry = TokenRegistry::new();
        register_tesla(&mut registry);
        assert!(registry.set_active(&t1(), false).unwrap());
        assert!(!registry.set_active(&t1(), false).unwrap());

        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.active().count(), 0);
    }

    #[test]
    fn test_set_active_unknown() {
        let mut registry = TokenRegistry::new();
        assert!(matches!(
            registry.set_active(&t1(), true),
            Err(MarketError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_invalid_listing_fields() {
        let mut registry = TokenRegistry::new();
        let empty_symbol = registry.register(t1(), "Tesla Peg Token", "  ", "TSLA", "https://x.io");
        assert!(matches!(empty_symbol, Err(MarketError::InvalidListing { .. })));

        let bad_uri = registry.register(t1(), "Tesla Peg Token", "PTSL", "TSLA", "ftp://x.io");
        assert!(matches!(bad_uri, Err(MarketError::InvalidListing { .. })));

        let bare_scheme = registry.register(t1(), "Tesla Peg Token", "PTSL", "TSLA", "https://");
        assert!(matches!(bare_scheme, Err(MarketError::InvalidListing { .. })));

        assert!(registry.all().is_empty());
    }
}

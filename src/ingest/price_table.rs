use super::swap_record::parse_address;
use crate::utils::{Token, asset_key};
use alloy_primitives::Address;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// USD valuation of one asset for the analysis window.
#[derive(Debug, Clone, Serialize)]
pub struct PriceEntry {
    pub token: Token,
    pub price_usd: f64,
}

#[derive(Debug, Deserialize)]
struct RawPriceEntry {
    symbol: String,
    price_usd: f64,
    #[serde(default)]
    decimals: Option<u8>,
}

/// Asset -> {symbol, USD price, decimals}. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    entries: HashMap<Address, PriceEntry>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: Token, price_usd: f64) {
        self.entries.insert(token.get_address(), PriceEntry { token, price_usd });
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with_price(mut self, address: Address, symbol: &str, price_usd: f64, decimals: u8) -> Self {
        self.insert(Token::new_with_data(address, Some(symbol.to_string()), None, Some(decimals)), price_usd);
        self
    }

    pub fn get(&self, address: &Address) -> Option<&PriceEntry> {
        self.entries.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }

    pub fn price_usd(&self, address: &Address) -> Option<f64> {
        self.get(address).map(|e| e.price_usd)
    }

    pub fn decimals(&self, address: &Address) -> Option<u8> {
        self.get(address).map(|e| e.token.get_decimals())
    }

    pub fn symbol(&self, address: &Address) -> Option<&str> {
        self.get(address).and_then(|e| e.token.symbol())
    }

    pub fn lookup_by_symbol(&self, symbol: &str) -> Option<&PriceEntry> {
        self.entries.values().find(|e| e.token.symbol() == Some(symbol))
    }

    /// Reduce to the `{asset: USD price}` map the optimizer works on.
    pub fn usd_prices(&self) -> HashMap<Address, f64> {
        self.entries.iter().map(|(address, entry)| (*address, entry.price_usd)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a `{address: {symbol, price_usd, decimals}}` document.
    ///
    /// Entries with a bad address, a missing field or an unusable price are skipped
    /// with a warning. Returns the table and the number of skipped entries.
    pub fn from_json_str(json: &str) -> Result<(Self, usize)> {
        let raw: Value = serde_json::from_str(json)?;
        let Value::Object(map) = raw else {
            return Err(eyre!("price table must be a JSON object keyed by asset address"));
        };

        let mut table = PriceTable::new();
        let mut skipped = 0usize;
        for (key, value) in map {
            let address = match parse_address(&key) {
                Ok(address) => address,
                Err(e) => {
                    warn!("Skipping price entry {}: {}", key, e);
                    skipped += 1;
                    continue;
                }
            };
            let entry = match serde_json::from_value::<RawPriceEntry>(value) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping malformed price entry for {}: {}", key, e);
                    skipped += 1;
                    continue;
                }
            };
            if !entry.price_usd.is_finite() || entry.price_usd < 0.0 {
                warn!("Skipping price entry for {}: unusable price {}", key, entry.price_usd);
                skipped += 1;
                continue;
            }

            debug!("{}: {} {:.10} USD", asset_key(&address), entry.symbol, entry.price_usd);
            table.insert(Token::new_with_data(address, Some(entry.symbol), None, entry.decimals), entry.price_usd);
        }

        Ok((table, skipped))
    }
}

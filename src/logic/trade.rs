use crate::utils::asset_key;
use alloy_primitives::Address;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TradeError {
    #[error("trade quantity must be positive and finite, got {0}")]
    InvalidQuantity(f64),
    #[error("trade rate must be positive and finite, got {0}")]
    InvalidRate(f64),
}

/// Gas paid by the transaction carrying an observed trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GasCost {
    /// Fee in the chain's native asset (ETH).
    pub native: f64,
    pub usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOrigin {
    /// Decoded from a pending transaction.
    Observed,
    /// Synthesized to close a cycle back to the base asset. Never on chain, never pays gas.
    Mediator,
}

/// A normalized swap intent: `quantity` units of the source asset at `rate` destination units each.
///
/// Quantity and rate are checked once at construction, so every `Trade` is valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    #[serde(rename = "src")]
    source_asset: Address,
    #[serde(rename = "dst")]
    dest_asset: Address,
    quantity: f64,
    rate: f64,
    src_symbol: Option<String>,
    dst_symbol: Option<String>,
    gas_fee_native: Option<f64>,
    gas_fee_usd: Option<f64>,
    origin: TradeOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_hash: Option<String>,
}

impl Trade {
    pub fn new(source_asset: Address, dest_asset: Address, quantity: f64, rate: f64) -> Result<Self, TradeError> {
        Self::build(source_asset, dest_asset, quantity, rate, TradeOrigin::Observed)
    }

    pub fn mediator(source_asset: Address, dest_asset: Address, quantity: f64, rate: f64) -> Result<Self, TradeError> {
        Self::build(source_asset, dest_asset, quantity, rate, TradeOrigin::Mediator)
    }

    fn build(
        source_asset: Address,
        dest_asset: Address,
        quantity: f64,
        rate: f64,
        origin: TradeOrigin,
    ) -> Result<Self, TradeError> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        if !(rate.is_finite() && rate > 0.0) {
            return Err(TradeError::InvalidRate(rate));
        }
        Ok(Self {
            source_asset,
            dest_asset,
            quantity,
            rate,
            src_symbol: None,
            dst_symbol: None,
            gas_fee_native: None,
            gas_fee_usd: None,
            origin,
            tx_hash: None,
        })
    }

    pub fn with_symbols(mut self, src_symbol: Option<String>, dst_symbol: Option<String>) -> Self {
        self.src_symbol = src_symbol;
        self.dst_symbol = dst_symbol;
        self
    }

    /// Attach the gas paid by the carrying transaction. Ignored for mediators.
    pub fn with_gas(mut self, gas: GasCost) -> Self {
        if self.origin == TradeOrigin::Observed {
            self.gas_fee_native = Some(gas.native);
            self.gas_fee_usd = Some(gas.usd);
        }
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: Option<String>) -> Self {
        self.tx_hash = tx_hash;
        self
    }

    pub fn get_source_asset(&self) -> Address {
        self.source_asset
    }

    pub fn get_dest_asset(&self) -> Address {
        self.dest_asset
    }

    pub fn get_quantity(&self) -> f64 {
        self.quantity
    }

    pub fn get_rate(&self) -> f64 {
        self.rate
    }

    pub fn get_src_symbol(&self) -> Option<&str> {
        self.src_symbol.as_deref()
    }

    pub fn get_dst_symbol(&self) -> Option<&str> {
        self.dst_symbol.as_deref()
    }

    pub fn get_gas(&self) -> Option<GasCost> {
        match (self.gas_fee_native, self.gas_fee_usd) {
            (Some(native), Some(usd)) => Some(GasCost { native, usd }),
            _ => None,
        }
    }

    pub fn get_tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    pub fn is_mediator(&self) -> bool {
        self.origin == TradeOrigin::Mediator
    }

    /// True if the trade goes between `a` and `b` in either direction.
    pub fn connects(&self, a: Address, b: Address) -> bool {
        (self.source_asset == a && self.dest_asset == b) || (self.source_asset == b && self.dest_asset == a)
    }
}

impl Display for Trade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let src = self.src_symbol.clone().unwrap_or_else(|| asset_key(&self.source_asset));
        let dst = self.dst_symbol.clone().unwrap_or_else(|| asset_key(&self.dest_asset));
        write!(f, "{}->{} q={} r={}", src, dst, self.quantity, self.rate)?;
        if self.is_mediator() {
            write!(f, " (mediator)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Address {
        Address::repeat_byte(0xA)
    }

    fn b() -> Address {
        Address::repeat_byte(0xB)
    }

    #[test]
    fn test_rejects_non_positive_or_non_finite_values() {
        assert_eq!(Trade::new(a(), b(), 0.0, 1.0).unwrap_err(), TradeError::InvalidQuantity(0.0));
        assert_eq!(Trade::new(a(), b(), -2.0, 1.0).unwrap_err(), TradeError::InvalidQuantity(-2.0));
        assert_eq!(Trade::new(a(), b(), 1.0, 0.0).unwrap_err(), TradeError::InvalidRate(0.0));
        assert!(Trade::new(a(), b(), f64::NAN, 1.0).is_err());
        assert!(Trade::new(a(), b(), 1.0, f64::INFINITY).is_err());
        assert!(Trade::mediator(a(), b(), 1.0, -0.5).is_err());
    }

    #[test]
    fn test_mediator_never_carries_gas() {
        let gas = GasCost { native: 0.01, usd: 30.0 };
        let observed = Trade::new(a(), b(), 2.0, 0.5).unwrap().with_gas(gas);
        let mediator = Trade::mediator(b(), a(), 2.0, 2.0).unwrap().with_gas(gas);

        assert_eq!(observed.get_gas(), Some(gas));
        assert!(!observed.is_mediator());
        assert_eq!(mediator.get_gas(), None);
        assert!(mediator.is_mediator());
    }

    #[test]
    fn test_connects_is_direction_agnostic() {
        let trade = Trade::new(a(), b(), 1.0, 1.0).unwrap();
        assert!(trade.connects(a(), b()));
        assert!(trade.connects(b(), a()));
        assert!(!trade.connects(a(), Address::repeat_byte(0xC)));
    }

    #[test]
    fn test_display_prefers_symbols() {
        let trade = Trade::new(a(), b(), 2.0, 0.5).unwrap().with_symbols(Some("A".into()), Some("B".into()));
        assert_eq!(trade.to_string(), "A->B q=2 r=0.5");
    }
}

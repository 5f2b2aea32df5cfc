use alloy_primitives::{Address, address};

/// Canonical WETH on Ethereum mainnet. Default base asset and gas asset.
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

pub const NATIVE_DECIMALS: u8 = 18;

/// Allowed relative deviation of an implied swap rate from the fair price.
pub const FAIR_PRICE_TOLERANCE: f64 = 0.10;

/// WETH/USD used when the gas asset has no entry in the price table.
pub const FALLBACK_GAS_PRICE_USD: f64 = 3842.42;

pub const GAS_ASSET_SYMBOL: &str = "WETH";

/// Key of the batch-wide summary record in the serialized report.
pub const SUMMARY_KEY: &str = "_summary";

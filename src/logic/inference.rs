use super::trade::{GasCost, Trade, TradeError};
use super::types::AnalysisConfig;
use crate::ingest::{DecodedSwap, PriceTable, SwapRecordError, TradeShape};
use crate::utils::{Token, asset_key, to_float_with_decimals};
use alloy_primitives::{Address, U256};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a decoded swap did not become a Trade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("unsupported function {0:?}")]
    UnsupportedFunction(String),
    #[error(transparent)]
    Record(#[from] SwapRecordError),
    #[error("missing {0}")]
    MissingAmount(&'static str),
    #[error("{0} is zero")]
    ZeroAmount(&'static str),
    #[error("implied rate {0} is not positive")]
    NonPositiveRate(f64),
    #[error("asset {} has no USD price", asset_key(.0))]
    UnpricedAsset(Address),
    #[error(transparent)]
    InvalidTrade(#[from] TradeError),
}

impl InferenceError {
    /// Stable label used to count skips.
    pub fn reason(&self) -> &'static str {
        match self {
            InferenceError::UnsupportedFunction(_) => "unsupported_function",
            InferenceError::Record(SwapRecordError::ShortPath(_)) => "short_path",
            InferenceError::Record(SwapRecordError::InvalidAddress(_)) => "invalid_address",
            InferenceError::MissingAmount(_) => "missing_amount",
            InferenceError::ZeroAmount(_) => "zero_amount",
            InferenceError::NonPositiveRate(_) => "non_positive_rate",
            InferenceError::UnpricedAsset(_) => "unpriced_asset",
            InferenceError::InvalidTrade(_) => "invalid_trade",
        }
    }
}

/// Counts of what happened to each record of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    pub records_total: usize,
    pub trades_accepted: usize,
    pub rates_clamped: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

impl IngestStats {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Maps decoded swaps to normalized Trades.
pub struct TradeInference {
    config: AnalysisConfig,
}

impl TradeInference {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Infer a Trade for every swap that supports one; the rest are logged and counted.
    pub fn infer_batch(&self, swaps: &[DecodedSwap], prices: &PriceTable) -> (Vec<Trade>, IngestStats) {
        let gas_price_usd = self.gas_asset_price_usd(prices);
        let mut stats = IngestStats { records_total: swaps.len(), ..Default::default() };
        let mut trades = Vec::with_capacity(swaps.len());

        for swap in swaps {
            match self.infer_with_gas_price(swap, prices, gas_price_usd) {
                Ok((trade, clamped)) => {
                    if clamped {
                        stats.rates_clamped += 1;
                    }
                    trades.push(trade);
                }
                Err(e) => {
                    warn!("Skipping swap {} ({}): {}", swap.hash.as_deref().unwrap_or("?"), swap.function, e);
                    *stats.skipped.entry(e.reason()).or_default() += 1;
                }
            }
        }

        stats.trades_accepted = trades.len();
        info!(
            "Inferred {} trades from {} swaps ({} skipped, {} rates clamped to fair price)",
            stats.trades_accepted,
            stats.records_total,
            stats.skipped_total(),
            stats.rates_clamped
        );
        (trades, stats)
    }

    pub fn infer(&self, swap: &DecodedSwap, prices: &PriceTable) -> Result<Trade, InferenceError> {
        self.infer_with_gas_price(swap, prices, self.gas_asset_price_usd(prices)).map(|(trade, _)| trade)
    }

    fn infer_with_gas_price(
        &self,
        swap: &DecodedSwap,
        prices: &PriceTable,
        gas_price_usd: f64,
    ) -> Result<(Trade, bool), InferenceError> {
        let kind = swap.kind().ok_or_else(|| InferenceError::UnsupportedFunction(swap.function.clone()))?;
        let (src, dst) = swap.endpoints(self.config.default_token_decimals)?;

        let src_decimals = self.decimals_for(&src, prices);
        let dst_decimals = self.decimals_for(&dst, prices);
        let (quantity, rate) = infer_quantity_and_rate(swap, kind.shape(), src_decimals, dst_decimals)?;

        let src_address = src.get_address();
        let dst_address = dst.get_address();

        let mut clamped = false;
        let rate = match fair_rate(prices.price_usd(&src_address), prices.price_usd(&dst_address)) {
            Some(fair) => {
                let bounded = clamp_to_fair(rate, fair, self.config.fair_price_tolerance);
                if bounded != rate {
                    debug!("Clamped rate {} -> {} (fair {}) for {}", rate, bounded, fair, swap.function);
                    clamped = true;
                }
                bounded
            }
            None => rate,
        };

        for address in [src_address, dst_address] {
            if !prices.contains(&address) {
                return Err(InferenceError::UnpricedAsset(address));
            }
        }

        let gas = gas_cost(swap, gas_price_usd, self.config.native_decimals);
        let trade = Trade::new(src_address, dst_address, quantity, rate)?
            .with_symbols(Some(self.symbol_for(&src, prices)), Some(self.symbol_for(&dst, prices)))
            .with_gas(gas)
            .with_tx_hash(swap.hash.clone());

        Ok((trade, clamped))
    }

    /// USD price of the gas asset: by address, then by symbol, then the configured fallback.
    pub fn gas_asset_price_usd(&self, prices: &PriceTable) -> f64 {
        if let Some(price) = prices.price_usd(&self.config.gas_asset) {
            return price;
        }
        if let Some(entry) = prices.lookup_by_symbol(&self.config.gas_asset_symbol) {
            return entry.price_usd;
        }
        debug!("Gas asset not priced, using fallback {} USD", self.config.fallback_gas_price_usd);
        self.config.fallback_gas_price_usd
    }

    fn decimals_for(&self, token: &Token, prices: &PriceTable) -> u8 {
        prices.decimals(&token.get_address()).unwrap_or_else(|| token.get_decimals())
    }

    fn symbol_for(&self, token: &Token, prices: &PriceTable) -> String {
        token.symbol().or_else(|| prices.symbol(&token.get_address())).map(str::to_string).unwrap_or_else(|| token.get_symbol())
    }
}

/// Infer a single trade outside of a batch run.
pub fn infer_trade(swap: &DecodedSwap, prices: &PriceTable, config: &AnalysisConfig) -> Result<Trade, InferenceError> {
    TradeInference::new(config.clone()).infer(swap, prices)
}

/// Quantity (source units) and rate (destination per source) implied by the call arguments.
///
/// Exact-input: `q = amountIn`, `r = amountOutMin / amountIn`.
/// Exact-output: `q = amountInMax`, `r = amountOut / amountInMax`.
pub fn infer_quantity_and_rate(
    swap: &DecodedSwap,
    shape: TradeShape,
    src_decimals: u8,
    dst_decimals: u8,
) -> Result<(f64, f64), InferenceError> {
    let (input, output) = match shape {
        TradeShape::ExactInput => (
            required("amountIn", swap.exact_input_amount())?,
            required("amountOutMin", swap.amount_out_min)?,
        ),
        TradeShape::ExactOutput => (
            required("amountInMax", swap.max_input_amount())?,
            required("amountOut", swap.amount_out)?,
        ),
    };

    let quantity = to_float_with_decimals(input, src_decimals);
    let out = to_float_with_decimals(output, dst_decimals);
    if quantity <= 0.0 {
        return Err(InferenceError::NonPositiveRate(0.0));
    }
    let rate = out / quantity;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(InferenceError::NonPositiveRate(rate));
    }
    Ok((quantity, rate))
}

fn required(field: &'static str, amount: Option<U256>) -> Result<U256, InferenceError> {
    match amount {
        None => Err(InferenceError::MissingAmount(field)),
        Some(v) if v.is_zero() => Err(InferenceError::ZeroAmount(field)),
        Some(v) => Ok(v),
    }
}

/// `price[source] / price[destination]` when both are known and positive.
pub fn fair_rate(src_price_usd: Option<f64>, dst_price_usd: Option<f64>) -> Option<f64> {
    match (src_price_usd, dst_price_usd) {
        (Some(src), Some(dst)) if src > 0.0 && dst > 0.0 => Some(src / dst),
        _ => None,
    }
}

/// Clamp `rate` into `[fair * (1 - tolerance), fair * (1 + tolerance)]`.
pub fn clamp_to_fair(rate: f64, fair: f64, tolerance: f64) -> f64 {
    let low = fair * (1.0 - tolerance);
    let high = fair * (1.0 + tolerance);
    if rate < low {
        low
    } else if rate > high {
        high
    } else {
        rate
    }
}

/// Gas paid by the swap's transaction.
///
/// Price: effective, else legacy, else the larger EIP-1559 cap. Quantity: gas used,
/// else the gas limit. Missing either gives a zero fee.
pub fn gas_cost(swap: &DecodedSwap, gas_asset_price_usd: f64, native_decimals: u8) -> GasCost {
    let price = preferred_gas_price(swap);
    let quantity = non_zero(swap.gas_used).or(non_zero(swap.gas_limit));

    let native = match (price, quantity) {
        (Some(price), Some(quantity)) => to_float_with_decimals(price.saturating_mul(quantity), native_decimals),
        _ => 0.0,
    };
    GasCost { native, usd: native * gas_asset_price_usd }
}

fn preferred_gas_price(swap: &DecodedSwap) -> Option<U256> {
    non_zero(swap.effective_gas_price).or(non_zero(swap.gas_price)).or_else(|| {
        match (non_zero(swap.max_fee_per_gas), non_zero(swap.max_priority_fee_per_gas)) {
            (Some(max_fee), Some(priority)) => Some(max_fee.max(priority)),
            (max_fee, priority) => max_fee.or(priority),
        }
    })
}

fn non_zero(value: Option<U256>) -> Option<U256> {
    value.filter(|v| !v.is_zero())
}

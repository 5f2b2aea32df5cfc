use super::aggregator::aggregate;
use super::inference::{IngestStats, TradeInference};
use super::optimizer::BatchOptimizer;
use super::trade::Trade;
use super::types::{AnalysisConfig, BatchResult};
use crate::ingest::{DecodedSwap, PriceSource, PriceTable, SwapSource};
use crate::utils::asset_key;
use alloy_primitives::Address;
use eyre::{Result, WrapErr};
use std::collections::HashMap;
use tracing::{info, warn};

/// BatchAnalyzer runs one mempool batch end to end:
/// 1. Inference: decoded swaps -> normalized trades (with gas)
/// 2. Optimization: per-pair forward/reverse prefix selection against the base asset
/// 3. Aggregation: gas accounting and the batch summary
pub struct BatchAnalyzer {
    config: AnalysisConfig,
    inference: TradeInference,
    optimizer: BatchOptimizer,
}

impl BatchAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            inference: TradeInference::new(config.clone()),
            optimizer: BatchOptimizer::new(config.clone()),
            config,
        }
    }

    /// Load a batch from `source` and analyze it.
    pub async fn run<S: SwapSource + PriceSource>(&self, source: &S) -> Result<(BatchResult, IngestStats)> {
        let prices = source.load_prices().await.wrap_err("loading price table")?;
        let swaps = source.load_swaps().await.wrap_err("loading decoded swaps")?;
        Ok(self.analyze(&swaps, &prices))
    }

    pub fn analyze(&self, swaps: &[DecodedSwap], prices: &PriceTable) -> (BatchResult, IngestStats) {
        info!("Analyzing batch of {} swaps against base {}", swaps.len(), asset_key(&self.config.base_asset));

        if prices.is_empty() {
            warn!("Price table is empty, every swap will be skipped");
        } else if !prices.contains(&self.config.base_asset) {
            warn!("Base asset {} has no USD price, no pair can be evaluated", asset_key(&self.config.base_asset));
        }

        let (trades, stats) = self.inference.infer_batch(swaps, prices);
        let result = self.analyze_trades(&trades, &prices.usd_prices());
        (result, stats)
    }

    /// Optimize and aggregate already-normalized trades.
    pub fn analyze_trades(&self, trades: &[Trade], prices: &HashMap<Address, f64>) -> BatchResult {
        let decisions = self.optimizer.optimize(trades, prices, self.config.base_asset);
        aggregate(decisions, trades)
    }

    pub fn get_config(&self) -> &AnalysisConfig {
        &self.config
    }
}

/// Builder pattern for creating and configuring a BatchAnalyzer
pub struct BatchAnalyzerBuilder {
    config: AnalysisConfig,
}

impl BatchAnalyzerBuilder {
    pub fn new() -> Self {
        Self { config: AnalysisConfig::default() }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_base_asset(mut self, base_asset: Address) -> Self {
        self.config.base_asset = base_asset;
        self
    }

    pub fn with_fair_price_tolerance(mut self, tolerance: f64) -> Self {
        self.config.fair_price_tolerance = tolerance;
        self
    }

    pub fn with_gas_settings(mut self, gas_asset: Address, fallback_price_usd: f64) -> Self {
        self.config.gas_asset = gas_asset;
        self.config.fallback_gas_price_usd = fallback_price_usd;
        self
    }

    pub fn with_parallel_optimization(mut self, enabled: bool) -> Self {
        self.config.enable_parallel_optimization = enabled;
        self
    }

    pub fn build(self) -> Result<BatchAnalyzer> {
        self.config.validate()?;
        Ok(BatchAnalyzer::new(self.config))
    }
}

impl Default for BatchAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

use super::trade::Trade;
use crate::utils::config_loader::load_from_file;
use crate::utils::constants::{
    DEFAULT_TOKEN_DECIMALS, FAIR_PRICE_TOLERANCE, FALLBACK_GAS_PRICE_USD, GAS_ASSET_SYMBOL, NATIVE_DECIMALS,
    SUMMARY_KEY, WETH,
};
use crate::utils::asset_key;
use alloy_primitives::Address;
use eyre::{Result, WrapErr, eyre};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Outcome of optimizing one (base, other) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    None,
    /// Act on base -> other trades, close with an other -> base mediator.
    ExecuteForward,
    /// Act on other -> base trades, close with a base -> other mediator.
    ExecuteReverse,
}

/// Optimizer output for one non-base asset.
#[derive(Debug, Clone, PartialEq)]
pub struct PairDecision {
    pub base: Address,
    pub other: Address,
    pub decision: Decision,
    /// Best cumulative USD profit of the chosen direction, 0 when nothing is executed.
    pub profit: f64,
    /// Best cumulative profit over base -> other candidates, `None` without candidates.
    pub forward_profit: Option<f64>,
    /// Best cumulative profit over other -> base candidates, `None` without candidates.
    pub reverse_profit: Option<f64>,
    /// Selected trades in ascending-rate order; the last one is the mediator when present.
    pub executed: Vec<Trade>,
}

impl PairDecision {
    pub fn none(base: Address, other: Address, forward_profit: Option<f64>, reverse_profit: Option<f64>) -> Self {
        Self { base, other, decision: Decision::None, profit: 0.0, forward_profit, reverse_profit, executed: Vec::new() }
    }

    pub fn mediator(&self) -> Option<&Trade> {
        self.executed.last().filter(|t| t.is_mediator())
    }

    /// Executed trades that exist on chain.
    pub fn executed_observed(&self) -> impl Iterator<Item = &Trade> {
        self.executed.iter().filter(|t| !t.is_mediator())
    }

    pub fn pair_key(&self) -> String {
        pair_key(&self.base, &self.other)
    }

    pub fn description(&self) -> String {
        let base = self.symbol_of(self.base);
        let other = self.symbol_of(self.other);
        match self.decision {
            Decision::None => "Do nothing".to_string(),
            Decision::ExecuteForward => format!("Execute {base}->{other} and mediator ({other}->{base})"),
            Decision::ExecuteReverse => format!("Execute {other}->{base} and mediator ({base}->{other})"),
        }
    }

    fn symbol_of(&self, asset: Address) -> String {
        self.executed
            .iter()
            .find_map(|t| {
                if t.get_source_asset() == asset {
                    t.get_src_symbol()
                } else if t.get_dest_asset() == asset {
                    t.get_dst_symbol()
                } else {
                    None
                }
            })
            .map(str::to_string)
            .unwrap_or_else(|| asset_key(&asset))
    }
}

/// Per-pair record of the batch report: the decision plus its gas accounting.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub base: Address,
    pub other: Address,
    pub decision: Decision,
    pub description: String,
    pub profit: f64,
    pub forward_profit: Option<f64>,
    pub reverse_profit: Option<f64>,
    pub net_profit_after_included_gas_usd: f64,
    pub src_symbol: Option<String>,
    pub dst_symbol: Option<String>,
    pub executed: Vec<Trade>,
    pub executed_tx_count: usize,
    pub candidate_tx_count: usize,
    pub included_gas_native: f64,
    pub included_gas_usd: f64,
    pub total_candidate_gas_native: f64,
    pub total_candidate_gas_usd: f64,
    pub missed_gas_native: f64,
    pub missed_gas_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub pairs_total: usize,
    pub pairs_executed: usize,
    pub candidate_tx_total: usize,
    pub executed_tx_total: usize,
    pub total_profit_usd: f64,
    pub total_included_gas_native: f64,
    pub total_included_gas_usd: f64,
    pub total_missed_gas_native: f64,
    pub total_missed_gas_usd: f64,
    pub total_net_profit_after_included_gas_usd: f64,
    /// Net profit per USD of missed gas; `None` when no gas was missed.
    pub realized_to_missed_ratio: Option<f64>,
}

/// Everything one batch run produces, keyed by the non-base asset.
///
/// Serializes as a flat object: one entry per pair key plus `_summary`.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub pairs: BTreeMap<Address, PairReport>,
    pub summary: BatchSummary,
}

impl BatchResult {
    /// Pairs ordered by missed USD gas, largest first.
    pub fn top_by_missed_gas(&self, limit: usize) -> Vec<&PairReport> {
        let mut reports: Vec<&PairReport> = self.pairs.values().collect();
        reports.sort_by(|a, b| b.missed_gas_usd.total_cmp(&a.missed_gas_usd));
        reports.truncate(limit);
        reports
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len() + 1))?;
        for report in self.pairs.values() {
            map.serialize_entry(&pair_key(&report.base, &report.other), report)?;
        }
        map.serialize_entry(SUMMARY_KEY, &self.summary)?;
        map.end()
    }
}

pub fn pair_key(base: &Address, other: &Address) -> String {
    format!("({}, {})", asset_key(base), asset_key(other))
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Asset every other asset is evaluated against
    pub base_asset: Address,
    /// Asset gas fees are paid in, used to value them in USD
    pub gas_asset: Address,
    /// Symbol used to find the gas asset when its address is not in the price table
    pub gas_asset_symbol: String,
    /// Relative band around the fair price an implied rate is clamped into
    pub fair_price_tolerance: f64,
    /// USD price of the gas asset when the price table has none
    pub fallback_gas_price_usd: f64,
    pub native_decimals: u8,
    /// Decimals for tokens neither the price table nor the swap path describe
    pub default_token_decimals: u8,
    /// Evaluate pairs on the rayon pool
    pub enable_parallel_optimization: bool,
    /// Pairs listed in the CLI summary
    pub top_pairs_in_summary: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_asset: WETH,
            gas_asset: WETH,
            gas_asset_symbol: GAS_ASSET_SYMBOL.to_string(),
            fair_price_tolerance: FAIR_PRICE_TOLERANCE,
            fallback_gas_price_usd: FALLBACK_GAS_PRICE_USD,
            native_decimals: NATIVE_DECIMALS,
            default_token_decimals: DEFAULT_TOKEN_DECIMALS,
            enable_parallel_optimization: true,
            top_pairs_in_summary: 5,
        }
    }
}

impl AnalysisConfig {
    /// Defaults, overlaid with the TOML file if given, then with environment overrides.
    pub async fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, |key| std::env::var(key).ok()).await
    }

    /// Like [`AnalysisConfig::load`], reading overrides through `lookup` instead of the process environment.
    pub async fn load_with_env(file: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = match file {
            Some(path) => load_from_file::<AnalysisConfig>(path)
                .await
                .wrap_err_with(|| format!("loading config from {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        let config = config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MEV_*` overrides, looking each variable up through `lookup`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(base_asset) = lookup("MEV_BASE_ASSET") {
            self.base_asset =
                Address::from_str(base_asset.trim()).map_err(|e| eyre!("Invalid MEV_BASE_ASSET: {}", e))?;
        }

        if let Some(tolerance) = lookup("MEV_FAIR_PRICE_TOLERANCE") {
            self.fair_price_tolerance =
                tolerance.trim().parse().map_err(|e| eyre!("Invalid MEV_FAIR_PRICE_TOLERANCE: {}", e))?;
        }

        if let Some(price) = lookup("MEV_FALLBACK_GAS_PRICE_USD") {
            self.fallback_gas_price_usd =
                price.trim().parse().map_err(|e| eyre!("Invalid MEV_FALLBACK_GAS_PRICE_USD: {}", e))?;
        }

        if let Some(parallel) = lookup("MEV_PARALLEL") {
            self.enable_parallel_optimization =
                parallel.trim().parse().map_err(|e| eyre!("Invalid MEV_PARALLEL: {}", e))?;
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.fair_price_tolerance) {
            return Err(eyre!("fair_price_tolerance must be in [0, 1), got {}", self.fair_price_tolerance));
        }
        if !(self.fallback_gas_price_usd.is_finite() && self.fallback_gas_price_usd > 0.0) {
            return Err(eyre!("fallback_gas_price_usd must be positive, got {}", self.fallback_gas_price_usd));
        }
        Ok(())
    }
}

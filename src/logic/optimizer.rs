use super::trade::Trade;
use super::types::{AnalysisConfig, Decision, PairDecision};
use crate::utils::asset_key;
use alloy_primitives::Address;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// BatchOptimizer decides, for every asset traded against the base asset, which
/// same-direction subset of trades to act against.
///
/// Per-trade profit `q * (p[src] - p[dst] * r)` is affine and decreasing in the rate,
/// so sorting a direction by ascending rate sorts it by descending profit. The best
/// subset is then a prefix of that order, found with [`cumulative_argmax`].
/// Pairs are independent: no capital or inventory is shared between them.
pub struct BatchOptimizer {
    config: AnalysisConfig,
}

impl BatchOptimizer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Optimize every (base, J) pair for the non-base assets J seen in `trades`.
    ///
    /// Trades touching an asset without a USD price are ignored.
    pub fn optimize(
        &self,
        trades: &[Trade],
        prices: &HashMap<Address, f64>,
        base: Address,
    ) -> BTreeMap<Address, PairDecision> {
        let priced: Vec<&Trade> = trades
            .iter()
            .filter(|t| {
                let ok = prices.contains_key(&t.get_source_asset()) && prices.contains_key(&t.get_dest_asset());
                if !ok {
                    warn!("Ignoring unpriced trade {}", t);
                }
                ok
            })
            .collect();

        let assets: Vec<Address> = priced
            .iter()
            .flat_map(|t| [t.get_source_asset(), t.get_dest_asset()])
            .filter(|asset| *asset != base)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        debug!("Optimizing {} pairs against base {} over {} trades", assets.len(), asset_key(&base), priced.len());

        let decisions: Vec<(Address, PairDecision)> = if self.config.enable_parallel_optimization {
            assets.par_iter().map(|other| (*other, self.optimize_pair(&priced, prices, base, *other))).collect()
        } else {
            assets.iter().map(|other| (*other, self.optimize_pair(&priced, prices, base, *other))).collect()
        };

        decisions.into_iter().collect()
    }

    /// Decide a single (base, other) pair.
    pub fn optimize_pair(
        &self,
        trades: &[&Trade],
        prices: &HashMap<Address, f64>,
        base: Address,
        other: Address,
    ) -> PairDecision {
        let forward = sorted_candidates(trades, prices, base, other);
        let reverse = sorted_candidates(trades, prices, other, base);

        let forward_best = cumulative_argmax(&forward.iter().map(|(_, p)| *p).collect::<Vec<_>>());
        let reverse_best = cumulative_argmax(&reverse.iter().map(|(_, p)| *p).collect::<Vec<_>>());

        let forward_profit = forward_best.map(|(_, v)| v);
        let reverse_profit = reverse_best.map(|(_, v)| v);
        let forward_value = forward_profit.unwrap_or(f64::NEG_INFINITY);
        let reverse_value = reverse_profit.unwrap_or(f64::NEG_INFINITY);

        let selection = match (forward_best, reverse_best) {
            _ if forward_value <= 0.0 && reverse_value <= 0.0 => None,
            (Some((k, profit)), _) if forward_value >= reverse_value => Some((Decision::ExecuteForward, &forward, k, profit)),
            (_, Some((k, profit))) => Some((Decision::ExecuteReverse, &reverse, k, profit)),
            _ => None,
        };

        let Some((decision, candidates, k, profit)) = selection else {
            debug!(
                "Pair ({}, {}): forward={:?} reverse={:?} -> do nothing",
                asset_key(&base),
                asset_key(&other),
                forward_profit,
                reverse_profit
            );
            return PairDecision::none(base, other, forward_profit, reverse_profit);
        };

        let mut executed: Vec<Trade> = candidates[..=k].iter().map(|(t, _)| Trade::clone(t)).collect();
        match synthesize_mediator(&executed) {
            Some(mediator) => executed.push(mediator),
            None => warn!("No mediator for pair ({}, {}): zero executed quantity", asset_key(&base), asset_key(&other)),
        }

        let result = PairDecision { base, other, decision, profit, forward_profit, reverse_profit, executed };
        debug!(
            "Pair ({}, {}): forward={:?} reverse={:?} -> {} [{}]",
            asset_key(&base),
            asset_key(&other),
            forward_profit,
            reverse_profit,
            result.description(),
            result.executed.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
        );
        result
    }
}

/// Trades `from -> to` with their USD profit, in ascending-rate order.
///
/// The sort is stable, so equal rates keep batch order.
fn sorted_candidates<'a>(
    trades: &[&'a Trade],
    prices: &HashMap<Address, f64>,
    from: Address,
    to: Address,
) -> Vec<(&'a Trade, f64)> {
    let mut candidates: Vec<(&Trade, f64)> = trades
        .iter()
        .filter(|t| t.get_source_asset() == from && t.get_dest_asset() == to)
        .filter_map(|t| trade_profit(t, prices).map(|profit| (*t, profit)))
        .collect();
    candidates.sort_by(|(a, _), (b, _)| a.get_rate().total_cmp(&b.get_rate()));
    candidates
}

/// USD profit of acting against one trade: `q * (p[src] - p[dst] * r)`.
pub fn trade_profit(trade: &Trade, prices: &HashMap<Address, f64>) -> Option<f64> {
    let src_price = prices.get(&trade.get_source_asset())?;
    let dst_price = prices.get(&trade.get_dest_asset())?;
    Some(trade.get_quantity() * (src_price - dst_price * trade.get_rate()))
}

/// Index and value of the maximum running sum of `values`.
///
/// The earliest index wins ties. `None` for an empty slice.
pub fn cumulative_argmax(values: &[f64]) -> Option<(usize, f64)> {
    let mut running = 0.0;
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        running += v;
        if best.is_none_or(|(_, best_value)| running > best_value) {
            best = Some((i, running));
        }
    }
    best
}

/// Trade closing the executed cycle back to where it started.
///
/// Quantity is the executed total; rate is the reciprocal of the quantity-weighted
/// average rate. `None` when the executed list is empty or has no quantity.
pub fn synthesize_mediator(executed: &[Trade]) -> Option<Trade> {
    let first = executed.first()?;
    let total_quantity: f64 = executed.iter().map(|t| t.get_quantity()).sum();
    if total_quantity <= 0.0 {
        return None;
    }
    let average_rate = executed.iter().map(|t| t.get_rate() * t.get_quantity()).sum::<f64>() / total_quantity;

    Trade::mediator(first.get_dest_asset(), first.get_source_asset(), total_quantity, 1.0 / average_rate)
        .ok()
        .map(|m| m.with_symbols(first.get_dst_symbol().map(str::to_string), first.get_src_symbol().map(str::to_string)))
}

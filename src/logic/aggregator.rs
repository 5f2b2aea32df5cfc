use super::trade::{GasCost, Trade};
use super::types::{BatchResult, BatchSummary, PairDecision, PairReport};
use alloy_primitives::Address;
use std::collections::BTreeMap;
use tracing::info;

/// Attach gas accounting to every pair decision and roll them up into a batch summary.
///
/// `trades` must be the same collection the optimizer saw: every trade between the
/// base and a pair's asset counts as a candidate, selected or not.
pub fn aggregate(decisions: BTreeMap<Address, PairDecision>, trades: &[Trade]) -> BatchResult {
    let pairs: BTreeMap<Address, PairReport> =
        decisions.into_iter().map(|(other, decision)| (other, pair_report(decision, trades))).collect();
    let summary = summarize(pairs.values());

    info!(
        "Aggregated {} pairs ({} executed): profit {:.2} USD, included gas {:.2} USD, missed gas {:.2} USD",
        summary.pairs_total,
        summary.pairs_executed,
        summary.total_profit_usd,
        summary.total_included_gas_usd,
        summary.total_missed_gas_usd
    );

    BatchResult { pairs, summary }
}

pub fn pair_report(decision: PairDecision, trades: &[Trade]) -> PairReport {
    let candidates: Vec<&Trade> = trades.iter().filter(|t| t.connects(decision.base, decision.other)).collect();

    let included = sum_gas(decision.executed_observed());
    let total = sum_gas(candidates.iter().copied());
    let missed = GasCost { native: (total.native - included.native).max(0.0), usd: (total.usd - included.usd).max(0.0) };

    let executed_tx_count = decision.executed_observed().count();
    let src_symbol = decision.executed.first().and_then(|t| t.get_src_symbol()).map(str::to_string);
    let dst_symbol = decision.executed.last().and_then(|t| t.get_dst_symbol()).map(str::to_string);

    PairReport {
        base: decision.base,
        other: decision.other,
        decision: decision.decision,
        description: decision.description(),
        profit: decision.profit,
        forward_profit: decision.forward_profit,
        reverse_profit: decision.reverse_profit,
        net_profit_after_included_gas_usd: decision.profit - included.usd,
        src_symbol,
        dst_symbol,
        executed: decision.executed,
        executed_tx_count,
        candidate_tx_count: candidates.len(),
        included_gas_native: included.native,
        included_gas_usd: included.usd,
        total_candidate_gas_native: total.native,
        total_candidate_gas_usd: total.usd,
        missed_gas_native: missed.native,
        missed_gas_usd: missed.usd,
    }
}

pub fn summarize<'a>(reports: impl Iterator<Item = &'a PairReport>) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for report in reports {
        summary.pairs_total += 1;
        if report.executed_tx_count > 0 {
            summary.pairs_executed += 1;
        }
        summary.candidate_tx_total += report.candidate_tx_count;
        summary.executed_tx_total += report.executed_tx_count;
        summary.total_profit_usd += report.profit;
        summary.total_included_gas_native += report.included_gas_native;
        summary.total_included_gas_usd += report.included_gas_usd;
        summary.total_missed_gas_native += report.missed_gas_native;
        summary.total_missed_gas_usd += report.missed_gas_usd;
    }

    summary.total_net_profit_after_included_gas_usd = summary.total_profit_usd - summary.total_included_gas_usd;
    summary.realized_to_missed_ratio = (summary.total_missed_gas_usd > 0.0)
        .then(|| summary.total_net_profit_after_included_gas_usd / summary.total_missed_gas_usd);
    summary
}

// Mediators carry no gas record and drop out here.
fn sum_gas<'a>(trades: impl Iterator<Item = &'a Trade>) -> GasCost {
    trades.filter_map(|t| t.get_gas()).fold(GasCost::default(), |acc, gas| GasCost {
        native: acc.native + gas.native,
        usd: acc.usd + gas.usd,
    })
}

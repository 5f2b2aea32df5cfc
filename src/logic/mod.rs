/// Logic Layer - Batch MEV Analysis
///
/// This layer is responsible for:
/// - Inferring normalized trades (quantity, rate, gas) from decoded swaps
/// - Choosing, per (base, asset) pair, the profitable same-direction trade prefix
/// - Synthesizing the mediator trade that closes each executed cycle
/// - Gas accounting and the batch summary

pub mod aggregator;
pub mod analyzer;
pub mod inference;
pub mod optimizer;
pub mod trade;
pub mod types;


// Re-export key components from the logic layer
pub use aggregator::{aggregate, pair_report, summarize};
pub use analyzer::{BatchAnalyzer, BatchAnalyzerBuilder};
pub use inference::{
    InferenceError, IngestStats, TradeInference, clamp_to_fair, fair_rate, gas_cost, infer_quantity_and_rate, infer_trade,
};
pub use optimizer::{BatchOptimizer, cumulative_argmax, synthesize_mediator, trade_profit};
pub use trade::{GasCost, Trade, TradeError, TradeOrigin};
pub use types::{AnalysisConfig, BatchResult, BatchSummary, Decision, PairDecision, PairReport, pair_key};

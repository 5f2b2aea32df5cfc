// Layered architecture
pub mod ingest; // Ingest Layer: decoded mempool swaps, USD price table
pub mod logic; // Logic Layer: trade inference, pair optimization, gas accounting
pub mod report; // Report Layer: JSON results, run summary

// Common utilities and types
pub mod utils;

// Re-export key components from each layer
pub use ingest::{DecodedSwap, JsonFileSource, PriceSource, PriceTable, SwapKind, SwapSource};
pub use logic::{
    AnalysisConfig, BatchAnalyzer, BatchAnalyzerBuilder, BatchOptimizer, BatchResult, BatchSummary, Decision,
    GasCost, InferenceError, IngestStats, PairDecision, PairReport, Trade, TradeInference,
};
pub use report::{ReportWriter, render_summary};
pub use utils::Token;

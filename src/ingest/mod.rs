/// Ingest Layer - decoded mempool swaps and the USD price table
///
/// Upstream collaborators (mempool snapshot, ABI decoding, pool-based pricing)
/// write their results as JSON documents. This layer loads them, normalizes
/// asset addresses once, and drops malformed entries with a diagnostic.

pub mod price_table;
pub mod source;
pub mod swap_record;

pub use price_table::{PriceEntry, PriceTable};
pub use source::{JsonFileSource, PriceSource, SwapSource};
pub use swap_record::{DecodedSwap, PathToken, SwapKind, SwapRecordError, TradeShape, parse_address, parse_decoded_swaps};

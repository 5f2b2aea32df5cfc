use super::price_table::PriceTable;
use super::swap_record::{DecodedSwap, parse_decoded_swaps};
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::{info, warn};

/// Supplies the decoded mempool swaps for one batch.
#[async_trait]
pub trait SwapSource: Send + Sync {
    async fn load_swaps(&self) -> Result<Vec<DecodedSwap>>;
}

/// Supplies the asset -> USD price table for one batch.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn load_prices(&self) -> Result<PriceTable>;
}

/// Reads the decoder's `decoded_swaps.json` and the pricer's `exo.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    swaps_path: PathBuf,
    prices_path: PathBuf,
}

impl JsonFileSource {
    pub fn new(swaps_path: impl Into<PathBuf>, prices_path: impl Into<PathBuf>) -> Self {
        Self { swaps_path: swaps_path.into(), prices_path: prices_path.into() }
    }
}

#[async_trait]
impl SwapSource for JsonFileSource {
    async fn load_swaps(&self) -> Result<Vec<DecodedSwap>> {
        let contents = tokio::fs::read_to_string(&self.swaps_path)
            .await
            .wrap_err_with(|| format!("reading swaps from {}", self.swaps_path.display()))?;
        let (swaps, skipped) =
            parse_decoded_swaps(&contents).wrap_err_with(|| format!("parsing {}", self.swaps_path.display()))?;
        if skipped > 0 {
            warn!("Skipped {} malformed swap records in {}", skipped, self.swaps_path.display());
        }
        info!("Loaded {} decoded swaps from {}", swaps.len(), self.swaps_path.display());
        Ok(swaps)
    }
}

#[async_trait]
impl PriceSource for JsonFileSource {
    async fn load_prices(&self) -> Result<PriceTable> {
        let contents = tokio::fs::read_to_string(&self.prices_path)
            .await
            .wrap_err_with(|| format!("reading prices from {}", self.prices_path.display()))?;
        let (table, skipped) =
            PriceTable::from_json_str(&contents).wrap_err_with(|| format!("parsing {}", self.prices_path.display()))?;
        if skipped > 0 {
            warn!("Skipped {} malformed price entries in {}", skipped, self.prices_path.display());
        }
        info!("Loaded {} token prices from {}", table.len(), self.prices_path.display());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::WETH;

    #[tokio::test]
    async fn test_json_file_source_reads_both_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let swaps_path = dir.path().join("decoded_swaps.json");
        let prices_path = dir.path().join("exo.json");
        tokio::fs::write(&swaps_path, r#"[{"function": "swapExactTokensForTokens", "amountIn": 10}]"#).await?;
        tokio::fs::write(
            &prices_path,
            r#"{"0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2": {"symbol": "WETH", "price_usd": 3000.0}}"#,
        )
        .await?;

        let source = JsonFileSource::new(&swaps_path, &prices_path);
        let swaps = source.load_swaps().await?;
        let prices = source.load_prices().await?;

        assert_eq!(swaps.len(), 1);
        assert_eq!(prices.price_usd(&WETH), Some(3000.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = JsonFileSource::new("/nonexistent/decoded_swaps.json", "/nonexistent/exo.json");
        assert!(source.load_swaps().await.is_err());
        assert!(source.load_prices().await.is_err());
    }
}

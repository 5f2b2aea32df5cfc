use alloy_primitives::Address;
use clap::Parser;
use eyre::{Result, WrapErr, eyre};
use mev_batch::{AnalysisConfig, BatchAnalyzerBuilder, JsonFileSource, ReportWriter, render_summary};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Batch MEV analysis of pending UniswapV2 router swaps")]
struct Args {
    /// Decoded mempool swaps (JSON array)
    #[arg(long, default_value = "decoded_swaps.json")]
    swaps: PathBuf,

    /// Asset price table (JSON object keyed by address)
    #[arg(long, default_value = "exo.json")]
    prices: PathBuf,

    /// Where the per-pair results and summary are written
    #[arg(long, default_value = "mev_results.json")]
    output: PathBuf,

    /// Path to a TOML config file (optional)
    #[arg(long, env = "MEV_CONFIG")]
    config: Option<PathBuf>,

    /// Base asset address (overrides config)
    #[arg(long)]
    base_asset: Option<String>,

    /// Fair-price tolerance, e.g. 0.10 (overrides config)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Evaluate pairs on a single thread
    #[arg(long)]
    sequential: bool,

    /// Pairs listed in the summary, by missed gas (overrides config)
    #[arg(long)]
    top: Option<usize>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// CLI flags take priority over the config file and environment.
    fn apply_overrides(&self, mut config: AnalysisConfig) -> Result<AnalysisConfig> {
        if let Some(base_asset) = &self.base_asset {
            config.base_asset =
                Address::from_str(base_asset.trim()).map_err(|e| eyre!("Invalid --base-asset {}: {}", base_asset, e))?;
        }
        if let Some(tolerance) = self.tolerance {
            config.fair_price_tolerance = tolerance;
        }
        if self.sequential {
            config.enable_parallel_optimization = false;
        }
        if let Some(top) = self.top {
            config.top_pairs_in_summary = top;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_line_number(true).init();

    let config = AnalysisConfig::load(args.config.as_deref()).await?;
    let config = args.apply_overrides(config)?;
    let top_n = config.top_pairs_in_summary;

    let analyzer = BatchAnalyzerBuilder::new().with_config(config).build().wrap_err("invalid configuration")?;
    let source = JsonFileSource::new(&args.swaps, &args.prices);
    let (result, stats) = analyzer.run(&source).await?;

    ReportWriter::new(&args.output).write(&result).await?;
    info!("Results written to {}", args.output.display());

    println!("{}", render_summary(&result, &stats, top_n));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mev_batch::utils::constants::{USDC, WETH};

    #[test]
    fn test_cli_flags_override_config() -> Result<()> {
        let args = Args::parse_from([
            "mev-batch",
            "--base-asset",
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "--tolerance",
            "0.05",
            "--sequential",
            "--top",
            "3",
        ]);
        let config = args.apply_overrides(AnalysisConfig::default())?;
        assert_eq!(config.base_asset, USDC);
        assert_eq!(config.fair_price_tolerance, 0.05);
        assert!(!config.enable_parallel_optimization);
        assert_eq!(config.top_pairs_in_summary, 3);
        Ok(())
    }

    #[test]
    fn test_no_flags_keep_loaded_config() -> Result<()> {
        let args = Args::parse_from(["mev-batch"]);
        assert_eq!(args.swaps, PathBuf::from("decoded_swaps.json"));
        assert_eq!(args.output, PathBuf::from("mev_results.json"));

        let loaded = AnalysisConfig { fair_price_tolerance: 0.2, top_pairs_in_summary: 7, ..Default::default() };
        let config = args.apply_overrides(loaded.clone())?;
        assert_eq!(config, loaded);
        assert_eq!(config.base_asset, WETH);
        Ok(())
    }

    #[test]
    fn test_invalid_base_asset_flag_is_an_error() {
        let args = Args::parse_from(["mev-batch", "--base-asset", "usdc"]);
        let err = args.apply_overrides(AnalysisConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--base-asset"));
    }

    #[test]
    fn test_out_of_range_tolerance_flag_fails_build() -> Result<()> {
        let args = Args::parse_from(["mev-batch", "--tolerance", "1.5"]);
        let config = args.apply_overrides(AnalysisConfig::default())?;
        assert!(BatchAnalyzerBuilder::new().with_config(config).build().is_err());
        Ok(())
    }
}

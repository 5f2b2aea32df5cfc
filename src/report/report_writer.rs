use crate::logic::{BatchResult, IngestStats, PairReport};
use crate::utils::asset_key;
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// JSON writer for batch results
pub struct ReportWriter {
    output_file: PathBuf,
}

impl ReportWriter {
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self { output_file: output_file.into() }
    }

    /// Write `result` as pretty-printed JSON, replacing any previous report.
    pub async fn write(&self, result: &BatchResult) -> Result<()> {
        if let Some(parent) = self.output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .wrap_err_with(|| format!("creating {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(result)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.output_file)
            .await
            .wrap_err_with(|| format!("opening {}", self.output_file.display()))?;

        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        info!("Wrote {} pair reports to {}", result.pairs.len(), self.output_file.display());
        Ok(())
    }

    pub fn get_output_file_path(&self) -> &Path {
        &self.output_file
    }
}

/// Multi-line run summary: batch totals, then the `top_n` pairs by missed gas.
pub fn render_summary(result: &BatchResult, stats: &IngestStats, top_n: usize) -> String {
    let summary = &result.summary;
    let mut lines = vec![
        "=== MEV batch summary ===".to_string(),
        format!(
            "Swaps: {} decoded, {} trades, {} skipped, {} rates clamped",
            stats.records_total,
            stats.trades_accepted,
            stats.skipped_total(),
            stats.rates_clamped
        ),
    ];
    lines.extend(stats.skipped.iter().map(|(reason, count)| format!("  skipped {}: {}", reason, count)));

    lines.push(format!("Pairs executed: {}/{}", summary.pairs_executed, summary.pairs_total));
    lines.push(format!("Transactions executed: {}/{}", summary.executed_tx_total, summary.candidate_tx_total));
    lines.push(format!("Total profit: {:.4} USD", summary.total_profit_usd));
    lines.push(format!(
        "Included gas: {:.6} ETH ({:.4} USD)",
        summary.total_included_gas_native, summary.total_included_gas_usd
    ));
    lines.push(format!("Net profit after included gas: {:.4} USD", summary.total_net_profit_after_included_gas_usd));
    lines.push(format!("Missed gas: {:.6} ETH ({:.4} USD)", summary.total_missed_gas_native, summary.total_missed_gas_usd));
    lines.push(match summary.realized_to_missed_ratio {
        Some(ratio) => format!("Realized/missed ratio: {:.4}", ratio),
        None => "Realized/missed ratio: N/A (no missed gas)".to_string(),
    });

    let top = result.top_by_missed_gas(top_n);
    if !top.is_empty() {
        lines.push(format!("Top {} pairs by missed gas:", top.len()));
        lines.extend(top.into_iter().map(|report| format!("  {}", pair_line(report))));
    }
    lines.join("\n")
}

fn pair_line(report: &PairReport) -> String {
    format!(
        "{} | {} | profit {:.4} USD | missed gas {:.4} USD | {}/{} tx",
        report.dst_symbol.clone().unwrap_or_else(|| asset_key(&report.other)),
        report.description,
        report.profit,
        report.missed_gas_usd,
        report.executed_tx_count,
        report.candidate_tx_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{BatchAnalyzerBuilder, GasCost, Trade};
    use alloy_primitives::Address;
    use std::collections::HashMap;

    fn sample_result() -> BatchResult {
        let base = Address::repeat_byte(1);
        let trades = vec![
            Trade::new(base, Address::repeat_byte(2), 2.0, 0.5).unwrap(),
            Trade::new(Address::repeat_byte(3), base, 1.0, 2.0).unwrap(),
        ];
        let prices: HashMap<Address, f64> = (1u8..=3).map(|b| (Address::repeat_byte(b), 1.0)).collect();
        BatchAnalyzerBuilder::new().with_base_asset(base).build().unwrap().analyze_trades(&trades, &prices)
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs_and_valid_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("mev_results.json");
        let writer = ReportWriter::new(&path);
        writer.write(&sample_result()).await?;

        let contents = tokio::fs::read_to_string(writer.get_output_file_path()).await?;
        let json: serde_json::Value = serde_json::from_str(&contents)?;
        assert_eq!(json.as_object().map(|o| o.len()), Some(3));
        assert_eq!(json["_summary"]["pairs_total"], 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_replaces_previous_report() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("mev_results.json");
        tokio::fs::write(&path, "x".repeat(100_000)).await?;

        ReportWriter::new(&path).write(&BatchResult::default()).await?;
        let json: serde_json::Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?;
        assert_eq!(json["_summary"]["pairs_total"], 0);
        Ok(())
    }

    #[test]
    fn test_summary_reports_missing_ratio() {
        let text = render_summary(&sample_result(), &IngestStats::default(), 5);
        assert!(text.contains("Pairs executed: 1/2"));
        assert!(text.contains("N/A (no missed gas)"));
        assert!(text.contains("Top 2 pairs by missed gas:"));
    }

    #[test]
    fn test_summary_limits_top_pairs() {
        let text = render_summary(&sample_result(), &IngestStats::default(), 1);
        assert!(text.contains("Top 1 pairs by missed gas:"));
    }

    #[test]
    fn test_summary_lines_with_missed_gas() {
        let base = Address::repeat_byte(1);
        let trades = vec![
            Trade::new(base, Address::repeat_byte(2), 2.0, 0.5).unwrap().with_gas(GasCost { native: 0.0005, usd: 0.5 }),
            Trade::new(Address::repeat_byte(3), base, 1.0, 2.0).unwrap().with_gas(GasCost { native: 0.001, usd: 2.0 }),
        ];
        let prices: HashMap<Address, f64> = (1u8..=3).map(|b| (Address::repeat_byte(b), 1.0)).collect();
        let result = BatchAnalyzerBuilder::new().with_base_asset(base).build().unwrap().analyze_trades(&trades, &prices);

        let mut stats = IngestStats { records_total: 3, trades_accepted: 2, ..Default::default() };
        stats.skipped.insert("unsupported_function", 1);

        let text = render_summary(&result, &stats, 5);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=== MEV batch summary ===");
        assert_eq!(lines[1], "Swaps: 3 decoded, 2 trades, 1 skipped, 0 rates clamped");
        assert_eq!(lines[2], "  skipped unsupported_function: 1");
        assert_eq!(lines[3], "Pairs executed: 1/2");
        assert_eq!(lines[6], "Included gas: 0.000500 ETH (0.5000 USD)");
        assert_eq!(lines[7], "Net profit after included gas: 0.5000 USD");
        assert_eq!(lines[9], "Realized/missed ratio: 0.2500");
        assert_eq!(lines[10], "Top 2 pairs by missed gas:");
        assert!(lines[11].contains("missed gas 2.0000 USD"));
        assert!(!text.ends_with('\n'));
    }
}

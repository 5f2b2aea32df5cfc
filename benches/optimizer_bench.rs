use alloy_primitives::{Address, address};
use criterion::{Criterion, criterion_group, criterion_main};
use lazy_static::lazy_static;
use mev_batch::{AnalysisConfig, BatchOptimizer, Trade};
use std::collections::HashMap;
use std::hint::black_box;

const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

lazy_static! {
    static ref ASSETS: Vec<Address> = (0..200).map(|_| Address::random()).collect();
    static ref PRICES: HashMap<Address, f64> = {
        let mut prices: HashMap<Address, f64> =
            ASSETS.iter().enumerate().map(|(i, asset)| (*asset, 0.5 + i as f64 * 0.01)).collect();
        prices.insert(WETH, 3000.0);
        prices
    };
    static ref TRADES: Vec<Trade> = {
        let mut trades = Vec::new();
        for (i, asset) in ASSETS.iter().enumerate() {
            let fair = 3000.0 / PRICES[asset];
            for k in 0..50 {
                let skew = 0.9 + ((i * 31 + k * 17) % 21) as f64 * 0.01;
                let quantity = 0.1 + (k % 7) as f64 * 0.05;
                if let Ok(t) = Trade::new(WETH, *asset, quantity, fair * skew) {
                    trades.push(t);
                }
                if let Ok(t) = Trade::new(*asset, WETH, quantity * fair, skew / fair) {
                    trades.push(t);
                }
            }
        }
        trades
    };
}

fn optimizer(parallel: bool) -> BatchOptimizer {
    BatchOptimizer::new(AnalysisConfig { enable_parallel_optimization: parallel, ..Default::default() })
}

fn benchmark_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer");
    group.sample_size(10);

    let sequential = optimizer(false);
    let parallel = optimizer(true);

    group.bench_function("optimize_sequential", |b| {
        b.iter(|| sequential.optimize(black_box(&TRADES), black_box(&PRICES), WETH))
    });
    group.bench_function("optimize_parallel", |b| b.iter(|| parallel.optimize(black_box(&TRADES), black_box(&PRICES), WETH)));
    group.finish();
}

criterion_group!(benches, benchmark_optimizer);
criterion_main!(benches);

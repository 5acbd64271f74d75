//! 基準投資組合
//!
//! S&P 500、60/40 股債、純債券三個參考組合，與使用者組合並列比較。

use serde::Serialize;

use super::engine::{calculate_all_metrics_with, EngineSettings};
use super::scoring::calculate_risk_score;
use crate::domain_types::{Holding, HoldingType, PortfolioMetrics, ReturnsData};

/// 基準組合的計算結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub name: &'static str,
    pub metrics: PortfolioMetrics,
}

/// 基準組合定義（固定順序）
pub fn benchmark_portfolios() -> Vec<(&'static str, Vec<Holding>)> {
    let spy = |allocation| Holding::new("SPY", allocation, HoldingType::Etf).with_name("S&P 500");
    let agg = |allocation| Holding::new("AGG", allocation, HoldingType::Bond).with_name("Agg Bond");
    vec![
        ("S&P 500", vec![spy(100.0)]),
        ("60/40", vec![spy(60.0), agg(40.0)]),
        ("Bonds", vec![agg(100.0)]),
    ]
}

/// 計算所有基準組合的指標與分數
pub fn compute_benchmarks(settings: &EngineSettings, data: &ReturnsData) -> Vec<BenchmarkResult> {
    benchmark_portfolios()
        .into_iter()
        .map(|(name, holdings)| {
            let metrics = calculate_all_metrics_with(settings, &holdings, data);
            let score = calculate_risk_score(&holdings, &metrics);
            BenchmarkResult {
                name,
                metrics: metrics.with_risk_score(score),
            }
        })
        .collect()
}

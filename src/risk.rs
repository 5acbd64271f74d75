//! 風險分析模組
//!
//! 指標引擎、風險評分、外部供應商量尺換算、代理代號解析與基準組合。

pub mod benchmarks;
pub mod engine;
pub mod providers;
pub mod proxy;
pub mod scoring;

pub use benchmarks::{benchmark_portfolios, compute_benchmarks, BenchmarkResult};
pub use engine::{calculate_all_metrics, calculate_all_metrics_with, EngineSettings, RISK_FREE_RATE};
pub use providers::{normalize_to_internal, risk_profile, ProviderScale, RiskProfile, RiskProvider, RISK_PROVIDERS};
pub use proxy::{choose_proxy, resolve_proxies};
pub use scoring::{calculate_risk_score, ScoringPolicy};

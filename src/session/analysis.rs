use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::TickerPolicy;
use crate::data_provider::{fetch_missing, ReturnsFetcher};
use crate::domain_types::{Holding, PortfolioMetrics, ReturnsData};
use crate::risk::{
    calculate_all_metrics_with, calculate_risk_score, compute_benchmarks, resolve_proxies, BenchmarkResult,
    EngineSettings,
};

/// 分析狀態：報酬資料、目前組合指標與基準組合
#[derive(Debug, Clone)]
pub struct AnalysisState {
    settings: EngineSettings,
    policy: Arc<TickerPolicy>,
    returns_data: Option<Arc<ReturnsData>>,
    resolved_holdings: Vec<Holding>,
    metrics: Option<PortfolioMetrics>,
    benchmarks: Vec<BenchmarkResult>,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self::new(EngineSettings::default(), TickerPolicy::builtin())
    }
}

impl AnalysisState {
    pub fn new(settings: EngineSettings, policy: Arc<TickerPolicy>) -> Self {
        Self {
            settings,
            policy,
            returns_data: None,
            resolved_holdings: Vec::new(),
            metrics: None,
            benchmarks: Vec::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_returns_data(&mut self, data: ReturnsData) {
        self.returns_data = Some(Arc::new(data));
    }

    pub fn returns_data(&self) -> Option<Arc<ReturnsData>> {
        self.returns_data.clone()
    }

    /// 為資料集中沒有的代號按需取得序列，回傳合併數量
    pub async fn fetch_missing(&mut self, fetcher: &dyn ReturnsFetcher, holdings: &[Holding]) -> usize {
        let Some(shared) = self.returns_data.as_mut() else {
            return 0;
        };
        let missing = shared.missing_tickers(holdings);
        if missing.is_empty() {
            return 0;
        }
        fetch_missing(fetcher, Arc::make_mut(shared), &missing).await
    }

    /// 解析代理、計算指標與分數，並重新計算基準組合
    ///
    /// 尚未載入報酬資料時回傳 `None`。
    #[instrument(skip_all, fields(holdings = holdings.len()))]
    pub fn run_analysis(&mut self, holdings: &[Holding]) -> Option<&PortfolioMetrics> {
        let data = self.returns_data.clone()?;

        let resolved = resolve_proxies(&self.policy, holdings, &data);
        let metrics = calculate_all_metrics_with(&self.settings, &resolved, &data);
        let score = calculate_risk_score(holdings, &metrics);
        info!(
            "分析完成: 風險分數 {}，年化報酬 {:.2}%，最大回撤 {:.2}%",
            score,
            metrics.annualized_return * 100.0,
            metrics.max_drawdown * 100.0
        );

        self.benchmarks = compute_benchmarks(&self.settings, &data);
        self.resolved_holdings = resolved;
        self.metrics = Some(metrics.with_risk_score(score));
        self.metrics.as_ref()
    }

    pub fn metrics(&self) -> Option<&PortfolioMetrics> {
        self.metrics.as_ref()
    }

    /// 代理解析後實際參與計算的持倉
    pub fn resolved_holdings(&self) -> &[Holding] {
        &self.resolved_holdings
    }

    pub fn benchmarks(&self) -> &[BenchmarkResult] {
        &self.benchmarks
    }

    /// 清除分析結果，保留已載入的報酬資料
    pub fn reset(&mut self) {
        self.resolved_holdings.clear();
        self.metrics = None;
        self.benchmarks.clear();
    }
}

//! 最佳化網格
//!
//! 將原始持倉按比例縮減，騰出 p% 平均分配給 THIR 與 THLV，
//! 對 p = 0..=100 共 101 個點計算指標與分數。

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain_types::{round_allocation, Holding, HoldingType, PortfolioMetrics, ReturnsData};
use crate::risk::engine::{calculate_all_metrics_with, EngineSettings};
use crate::risk::scoring::calculate_risk_score;

pub const THIR_TICKER: &str = "THIR";
pub const THIR_NAME: &str = "THOR SDQ Index Rotation ETF";
pub const THLV_TICKER: &str = "THLV";
pub const THLV_NAME: &str = "THOR Equal Weight Low Volatility ETF";

/// 網格的最大混合比例
pub const MAX_BLEND: u8 = 100;
/// 縮減後低於此比例的持倉移除
const MIN_SCALED_ALLOCATION: f64 = 0.1;

/// 網格中的一個點
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// THIR + THLV 合計比例
    pub thor_allocation: u8,
    pub thir_pct: f64,
    pub thlv_pct: f64,
    pub holdings: Vec<Holding>,
    pub metrics: PortfolioMetrics,
    pub risk_score: u8,
}

/// 分別指定 THIR 與 THLV 比例的混合
pub fn apply_thor_split(holdings: &[Holding], thir_pct: f64, thlv_pct: f64) -> Vec<Holding> {
    let total = thir_pct + thlv_pct;
    if total == 0.0 {
        return holdings.to_vec();
    }

    let scale = (100.0 - total) / 100.0;
    let mut adjusted: Vec<Holding> = holdings
        .iter()
        .map(|h| Holding {
            allocation: h.allocation * scale,
            ..h.clone()
        })
        .filter(|h| h.allocation >= MIN_SCALED_ALLOCATION)
        .collect();

    if thir_pct > 0.0 {
        adjusted.push(Holding::new(THIR_TICKER, thir_pct, HoldingType::Etf).with_name(THIR_NAME));
    }
    if thlv_pct > 0.0 {
        adjusted.push(Holding::new(THLV_TICKER, thlv_pct, HoldingType::Etf).with_name(THLV_NAME));
    }
    adjusted
}

/// 以 p% 平均分配給 THIR / THLV 的混合；p = 0 時原樣回傳
pub fn apply_thor_allocation(holdings: &[Holding], thor_pct: u8) -> Vec<Holding> {
    let half = f64::from(thor_pct.min(MAX_BLEND)) / 2.0;
    apply_thor_split(holdings, half, half)
}

/// 計算指定 THIR / THLV 比例下的指標
pub fn compute_metrics_for_split(
    settings: &EngineSettings,
    holdings: &[Holding],
    data: &ReturnsData,
    thir_pct: f64,
    thlv_pct: f64,
) -> OptimizationResult {
    let blended = apply_thor_split(holdings, thir_pct, thlv_pct);
    let metrics = calculate_all_metrics_with(settings, &blended, data);
    let risk_score = calculate_risk_score(&blended, &metrics);
    let thor_allocation = round_allocation(thir_pct + thlv_pct).round().clamp(0.0, 100.0) as u8;

    OptimizationResult {
        thor_allocation,
        thir_pct,
        thlv_pct,
        holdings: blended,
        metrics: metrics.with_risk_score(risk_score),
        risk_score,
    }
}

/// 計算 p% 混合下的指標
pub fn compute_metrics_for_allocation(
    holdings: &[Holding],
    data: &ReturnsData,
    thor_pct: u8,
) -> OptimizationResult {
    compute_metrics_for_allocation_with(&EngineSettings::default(), holdings, data, thor_pct)
}

pub fn compute_metrics_for_allocation_with(
    settings: &EngineSettings,
    holdings: &[Holding],
    data: &ReturnsData,
    thor_pct: u8,
) -> OptimizationResult {
    let half = f64::from(thor_pct.min(MAX_BLEND)) / 2.0;
    compute_metrics_for_split(settings, holdings, data, half, half)
}

/// 101 點網格（依 p 遞增）
pub fn compute_optimization_grid(holdings: &[Holding], data: &ReturnsData) -> Vec<OptimizationResult> {
    compute_optimization_grid_with(&EngineSettings::default(), holdings, data)
}

#[instrument(skip_all, fields(holdings = holdings.len(), periods = data.len()))]
pub fn compute_optimization_grid_with(
    settings: &EngineSettings,
    holdings: &[Holding],
    data: &ReturnsData,
) -> Vec<OptimizationResult> {
    // 各點互相獨立；collect 保持 p 的順序
    let grid: Vec<OptimizationResult> = (0..=MAX_BLEND)
        .into_par_iter()
        .map(|p| compute_metrics_for_allocation_with(settings, holdings, data, p))
        .collect();
    debug!("最佳化網格完成，共 {} 點", grid.len());
    grid
}

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain_types::{Holding, PortfolioMetrics, ReturnsData};
use crate::optimization::{
    compute_metrics_for_split, compute_optimization_grid_with, find_optimal, OptimizationMode, OptimizationResult,
};
use crate::risk::EngineSettings;

/// 單一產品滑桿上限（THIR 與 THLV 合計不超過 50 + 50）
pub const MAX_SINGLE_PCT: f64 = 50.0;
/// 目標分數預設值
pub const DEFAULT_TARGET_SCORE: u8 = 50;

/// 最佳化狀態：101 點網格、滑桿位置與目前混合結果
#[derive(Debug, Clone)]
pub struct OptimizationState {
    settings: EngineSettings,
    grid: Vec<OptimizationResult>,
    slider_value: f64,
    thir_pct: f64,
    thlv_pct: f64,
    current_result: Option<OptimizationResult>,
    mode: OptimizationMode,
    target_score: u8,
    original_holdings: Vec<Holding>,
    returns_data: Option<Arc<ReturnsData>>,
}

impl Default for OptimizationState {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl OptimizationState {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            grid: Vec::new(),
            slider_value: 0.0,
            thir_pct: 0.0,
            thlv_pct: 0.0,
            current_result: None,
            mode: OptimizationMode::default(),
            target_score: DEFAULT_TARGET_SCORE,
            original_holdings: Vec::new(),
            returns_data: None,
        }
    }

    /// 計算網格並將滑桿歸零
    pub fn compute_grid(&mut self, holdings: &[Holding], data: Arc<ReturnsData>) {
        self.grid = compute_optimization_grid_with(&self.settings, holdings, &data);
        self.current_result = Some(compute_metrics_for_split(&self.settings, holdings, &data, 0.0, 0.0));
        self.slider_value = 0.0;
        self.thir_pct = 0.0;
        self.thlv_pct = 0.0;
        self.original_holdings = holdings.to_vec();
        self.returns_data = Some(data);
        info!("最佳化網格已建立，共 {} 點", self.grid.len());
    }

    pub fn is_computed(&self) -> bool {
        !self.grid.is_empty()
    }

    pub fn grid(&self) -> &[OptimizationResult] {
        &self.grid
    }

    pub fn slider_value(&self) -> f64 {
        self.slider_value
    }

    pub fn thir_pct(&self) -> f64 {
        self.thir_pct
    }

    pub fn thlv_pct(&self) -> f64 {
        self.thlv_pct
    }

    pub fn current_result(&self) -> Option<&OptimizationResult> {
        self.current_result.as_ref()
    }

    pub fn mode(&self) -> OptimizationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OptimizationMode) {
        self.mode = mode;
    }

    pub fn target_score(&self) -> u8 {
        self.target_score
    }

    pub fn set_target_score(&mut self, score: u8) {
        self.target_score = score.clamp(1, 100);
    }

    fn recompute(&mut self) {
        let Some(data) = &self.returns_data else {
            return;
        };
        let result = compute_metrics_for_split(&self.settings, &self.original_holdings, data, self.thir_pct, self.thlv_pct);
        debug!(
            "混合 THIR {:.1}% / THLV {:.1}%，風險分數 {}",
            self.thir_pct, self.thlv_pct, result.risk_score
        );
        self.current_result = Some(result);
    }

    /// 合計滑桿：四捨五入並限制在 0-100，平均分給兩檔產品
    pub fn set_slider_value(&mut self, value: f64) {
        if self.returns_data.is_none() {
            return;
        }
        let v = value.max(0.0).min(100.0).round();
        self.slider_value = v;
        self.thir_pct = v / 2.0;
        self.thlv_pct = v / 2.0;
        self.recompute();
    }

    /// THIR 比例，上限為 50 減去目前的 THLV
    pub fn set_thir_pct(&mut self, value: f64) {
        if self.returns_data.is_none() {
            return;
        }
        self.thir_pct = value.max(0.0).min(MAX_SINGLE_PCT - self.thlv_pct);
        self.slider_value = self.thir_pct + self.thlv_pct;
        self.recompute();
    }

    /// THLV 比例，上限為 50 減去目前的 THIR
    pub fn set_thlv_pct(&mut self, value: f64) {
        if self.returns_data.is_none() {
            return;
        }
        self.thlv_pct = value.max(0.0).min(MAX_SINGLE_PCT - self.thir_pct);
        self.slider_value = self.thir_pct + self.thlv_pct;
        self.recompute();
    }

    /// 依目前模式找出最佳混合並移動滑桿；網格未建立時回傳 `None`
    pub fn find_optimal_allocation(&mut self, current: &PortfolioMetrics) -> Option<u8> {
        if self.grid.is_empty() || self.returns_data.is_none() {
            return None;
        }
        let optimal = find_optimal(&self.grid, self.mode, current, Some(self.target_score));
        info!("模式 {} 的最佳 THOR 配置: {}%", self.mode, optimal);

        self.slider_value = f64::from(optimal);
        self.thir_pct = f64::from(optimal) / 2.0;
        self.thlv_pct = f64::from(optimal) / 2.0;
        self.current_result = self
            .grid
            .iter()
            .find(|point| point.thor_allocation == optimal)
            .cloned();
        if self.current_result.is_none() {
            self.recompute();
        }
        Some(optimal)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }
}

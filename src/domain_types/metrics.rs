use serde::{Deserialize, Serialize};

/// 投資組合風險 / 報酬輪廓
///
/// 純量指標皆為小數，`var95` 與 `cvar95` 為月損失（正值表示損失）。
/// `risk_score` 在評分器執行前保持 `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub annualized_return: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub var95: f64,
    pub cvar95: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    pub monthly_returns: Vec<f64>,
    pub drawdown_series: Vec<f64>,
}

impl PortfolioMetrics {
    /// 附上風險分數
    pub fn with_risk_score(mut self, score: u8) -> Self {
        self.risk_score = Some(score);
        self
    }

    /// 尚未評分時以 0 代替
    pub fn score_or_zero(&self) -> u8 {
        self.risk_score.unwrap_or(0)
    }
}

//! 風險評分（1-100）
//!
//! 波動度、最大回撤、年化 VaR 三個分段線性子分數，加上股票曝險，
//! 以固定權重加總後四捨五入。

use crate::domain_types::{Holding, PortfolioMetrics};

/// 分段線性曲線的一段：`x <= upper` 時取 `base + (x - lower) / width * span`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub lower: f64,
    pub width: f64,
    pub base: f64,
    pub span: f64,
}

const fn band(upper: f64, lower: f64, width: f64, base: f64, span: f64) -> Band {
    Band {
        upper,
        lower,
        width,
        base,
        span,
    }
}

/// 子分數曲線，最後一段的上限為無限大，結果上限 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScoreCurve {
    pub bands: [Band; 4],
}

impl SubScoreCurve {
    pub fn eval(&self, x: f64) -> f64 {
        self.bands
            .iter()
            .find(|b| x <= b.upper)
            .map(|b| (b.base + (x - b.lower) / b.width * b.span).min(100.0))
            .unwrap_or(f64::NAN)
    }
}

/// 各子分數的權重
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub volatility: f64,
    pub drawdown: f64,
    pub var: f64,
    pub equity: f64,
}

/// 評分政策表
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub volatility: SubScoreCurve,
    pub drawdown: SubScoreCurve,
    /// 以年化後的 VaR（月 VaR × √12）評分
    pub var: SubScoreCurve,
    pub var_periods_per_year: f64,
    pub weights: ScoreWeights,
}

impl ScoringPolicy {
    pub const DEFAULT: ScoringPolicy = ScoringPolicy {
        volatility: SubScoreCurve {
            bands: [
                band(0.05, 0.0, 0.05, 0.0, 20.0),
                band(0.15, 0.05, 0.10, 20.0, 30.0),
                band(0.25, 0.15, 0.10, 50.0, 30.0),
                band(f64::INFINITY, 0.25, 0.15, 80.0, 20.0),
            ],
        },
        drawdown: SubScoreCurve {
            bands: [
                band(0.10, 0.0, 0.10, 0.0, 25.0),
                band(0.25, 0.10, 0.15, 25.0, 25.0),
                band(0.50, 0.25, 0.25, 50.0, 35.0),
                band(f64::INFINITY, 0.50, 0.30, 85.0, 15.0),
            ],
        },
        var: SubScoreCurve {
            bands: [
                band(0.10, 0.0, 0.10, 0.0, 25.0),
                band(0.25, 0.10, 0.15, 25.0, 25.0),
                band(0.40, 0.25, 0.15, 50.0, 30.0),
                band(f64::INFINITY, 0.40, 0.20, 80.0, 20.0),
            ],
        },
        var_periods_per_year: 12.0,
        weights: ScoreWeights {
            volatility: 0.35,
            drawdown: 0.30,
            var: 0.20,
            equity: 0.15,
        },
    };

    /// 未四捨五入的加權分數
    pub fn raw_score(&self, holdings: &[Holding], metrics: &PortfolioMetrics) -> f64 {
        let vol = self.volatility.eval(metrics.volatility);
        let dd = self.drawdown.eval(metrics.max_drawdown.abs());
        let var = self.var.eval(metrics.var95 * self.var_periods_per_year.sqrt());
        let equity = equity_exposure(holdings);

        self.weights.volatility * vol
            + self.weights.drawdown * dd
            + self.weights.var * var
            + self.weights.equity * equity
    }

    /// 1-100 的風險分數，非有限的原始分數視為 1
    pub fn score(&self, holdings: &[Holding], metrics: &PortfolioMetrics) -> u8 {
        let raw = self.raw_score(holdings, metrics);
        if !raw.is_finite() {
            return 1;
        }
        raw.round().clamp(1.0, 100.0) as u8
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 股票曝險：股票與 ETF 持倉的配置比例合計
pub fn equity_exposure(holdings: &[Holding]) -> f64 {
    holdings
        .iter()
        .filter(|h| h.holding_type.is_equity())
        .map(|h| h.allocation)
        .sum()
}

/// 以預設政策計算風險分數
pub fn calculate_risk_score(holdings: &[Holding], metrics: &PortfolioMetrics) -> u8 {
    ScoringPolicy::DEFAULT.score(holdings, metrics)
}

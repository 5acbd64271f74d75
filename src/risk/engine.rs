//! 風險指標引擎
//!
//! 以持倉權重與月報酬矩陣計算投資組合月報酬，再由月報酬序列推導
//! 年化報酬、波動度、回撤、風險調整比率與 VaR/CVaR。所有函數皆為純函數。

use ndarray::{Array1, Array2, ArrayView1, Axis};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain_types::{Holding, PortfolioMetrics, ReturnsData};

/// 無風險利率（十年期公債殖利率）
pub const RISK_FREE_RATE: f64 = 0.045;
/// 每年期數（月資料）
pub const PERIODS_PER_YEAR: u32 = 12;
/// VaR / CVaR 信心水準
pub const VAR_CONFIDENCE: f64 = 0.95;
/// 部分覆蓋時重新縮放的權重上限
const RESCALE_CEILING: f64 = 0.99;

/// 引擎參數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
    /// 覆蓋權重介於 (0, 0.99) 時，以覆蓋權重放大投資組合報酬
    pub rescale_partial_coverage: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: RISK_FREE_RATE,
            periods_per_year: PERIODS_PER_YEAR,
            rescale_partial_coverage: false,
        }
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            periods_per_year: config.periods_per_year,
            rescale_partial_coverage: config.rescale_partial_coverage,
        }
    }
}

/// 非有限值一律視為 0
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// 取得持倉對應的序列與權重；沒有有效序列的持倉排除
fn covered_series<'a>(holdings: &[Holding], data: &'a ReturnsData) -> Vec<(&'a [f64], f64)> {
    holdings
        .iter()
        .filter_map(|h| data.series(h.data_ticker()).map(|series| (series, h.weight())))
        .collect()
}

/// 報酬矩陣：列為期間、欄為持倉
fn returns_matrix(periods: usize, covered: &[(&[f64], f64)]) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((periods, covered.len()));
    for (j, (series, _)) in covered.iter().enumerate() {
        matrix.column_mut(j).assign(&ArrayView1::from(*series));
    }
    matrix
}

/// 投資組合月報酬 = Σ 權重 × 報酬
pub fn portfolio_monthly_returns(
    settings: &EngineSettings,
    holdings: &[Holding],
    data: &ReturnsData,
) -> Vec<f64> {
    let periods = data.len();
    let covered = covered_series(holdings, data);
    if covered.is_empty() {
        return vec![0.0; periods];
    }

    let weights: Array1<f64> = covered.iter().map(|(_, w)| *w).collect();
    let mut returns = returns_matrix(periods, &covered).dot(&weights);

    if settings.rescale_partial_coverage {
        let covered_weight = weights.sum();
        if covered_weight > 0.0 && covered_weight < RESCALE_CEILING {
            debug!("覆蓋權重 {:.3}，重新縮放投資組合報酬", covered_weight);
            returns /= covered_weight;
        }
    }
    returns.to_vec()
}

/// 年化報酬（幾何）；累積值不為正時回傳 -1
pub fn annualized_return(returns: &[f64], periods_per_year: u32) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let cumulative: f64 = returns.iter().map(|r| 1.0 + r).product();
    if cumulative <= 0.0 {
        return -1.0;
    }
    let years = returns.len() as f64 / f64::from(periods_per_year);
    cumulative.powf(1.0 / years) - 1.0
}

/// 年化波動度（樣本標準差）
pub fn annualized_volatility(returns: &[f64], periods_per_year: u32) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    returns.iter().std_dev() * f64::from(periods_per_year).sqrt()
}

/// 以共變異數矩陣計算投資組合年化波動度
pub fn portfolio_volatility(settings: &EngineSettings, holdings: &[Holding], data: &ReturnsData) -> f64 {
    let periods = data.len();
    let covered = covered_series(holdings, data);
    if periods < 2 || covered.is_empty() {
        return 0.0;
    }

    let matrix = returns_matrix(periods, &covered);
    let Some(means) = matrix.mean_axis(Axis(0)) else {
        return 0.0;
    };
    let centered = &matrix - &means;
    let covariance = centered.t().dot(&centered) / (periods as f64 - 1.0);

    let weights: Array1<f64> = covered.iter().map(|(_, w)| *w).collect();
    let variance = weights.dot(&covariance.dot(&weights));
    sanitize((variance.max(0.0) * f64::from(settings.periods_per_year)).sqrt())
}

/// 回撤序列：淨值從 1 開始，峰值包含起始值
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut value = 1.0;
    let mut peak = 1.0_f64;
    returns
        .iter()
        .map(|r| {
            value *= 1.0 + r;
            peak = peak.max(value);
            value / peak - 1.0
        })
        .collect()
}

/// 最大回撤（回撤序列的最小值，空序列為 0）
pub fn max_drawdown(drawdowns: &[f64]) -> f64 {
    drawdowns.iter().copied().fold(0.0, f64::min)
}

pub fn sharpe_ratio(annual_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility == 0.0 {
        return 0.0;
    }
    (annual_return - risk_free_rate) / volatility
}

/// 下檔偏差：負報酬平方和除以總期數
pub fn downside_deviation(returns: &[f64], periods_per_year: u32) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    (sum_sq / returns.len() as f64).sqrt() * f64::from(periods_per_year).sqrt()
}

pub fn sortino_ratio(returns: &[f64], settings: &EngineSettings) -> f64 {
    let downside = downside_deviation(returns, settings.periods_per_year);
    if downside == 0.0 {
        return 0.0;
    }
    (annualized_return(returns, settings.periods_per_year) - settings.risk_free_rate) / downside
}

pub fn calmar_ratio(annual_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown == 0.0 {
        return 0.0;
    }
    annual_return / max_drawdown.abs()
}

fn sorted_returns(returns: &[f64]) -> Vec<f64> {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn tail_index(len: usize) -> usize {
    ((1.0 - VAR_CONFIDENCE) * len as f64).floor() as usize
}

/// 歷史模擬法 95% VaR（正值表示損失）
pub fn value_at_risk(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sorted = sorted_returns(returns);
    -sorted[tail_index(sorted.len())]
}

/// 95% CVaR：尾部（含 VaR 該點）的平均損失
pub fn conditional_var(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sorted = sorted_returns(returns);
    let tail = &sorted[..=tail_index(sorted.len())];
    -tail.iter().mean()
}

/// 以預設參數計算全部指標
pub fn calculate_all_metrics(holdings: &[Holding], data: &ReturnsData) -> PortfolioMetrics {
    calculate_all_metrics_with(&EngineSettings::default(), holdings, data)
}

/// 計算全部指標，`risk_score` 保持 `None` 由評分器填入
pub fn calculate_all_metrics_with(
    settings: &EngineSettings,
    holdings: &[Holding],
    data: &ReturnsData,
) -> PortfolioMetrics {
    let monthly_returns = portfolio_monthly_returns(settings, holdings, data);
    let annual_return = annualized_return(&monthly_returns, settings.periods_per_year);
    let volatility = annualized_volatility(&monthly_returns, settings.periods_per_year);
    let drawdowns = drawdown_series(&monthly_returns);
    let mdd = max_drawdown(&drawdowns);

    PortfolioMetrics {
        annualized_return: sanitize(annual_return),
        volatility: sanitize(volatility),
        max_drawdown: sanitize(mdd),
        sharpe_ratio: sanitize(sharpe_ratio(annual_return, volatility, settings.risk_free_rate)),
        sortino_ratio: sanitize(sortino_ratio(&monthly_returns, settings)),
        calmar_ratio: sanitize(calmar_ratio(annual_return, mdd)),
        var95: sanitize(value_at_risk(&monthly_returns)),
        cvar95: sanitize(conditional_var(&monthly_returns)),
        risk_score: None,
        monthly_returns,
        drawdown_series: drawdowns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_types::HoldingType;
    use std::collections::HashMap;

    fn assert_close(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "{} != {}", left, right);
    }

    fn dataset(series: &[(&str, Vec<f64>)]) -> ReturnsData {
        let len = series.first().map(|(_, s)| s.len()).unwrap_or(0);
        let dates = (0..len).map(|i| format!("2020-{:02}", i % 12 + 1)).collect();
        let returns: HashMap<String, Vec<f64>> =
            series.iter().map(|(t, s)| (t.to_string(), s.clone())).collect();
        ReturnsData::new(dates, returns)
    }

    fn holding(ticker: &str, allocation: f64) -> Holding {
        Holding::new(ticker, allocation, HoldingType::Etf)
    }

    #[test]
    fn test_annualized_return() {
        // 12 個月每月 1%
        let returns = vec![0.01; 12];
        assert_close(annualized_return(&returns, 12), 1.01_f64.powi(12) - 1.0);
        assert_eq!(annualized_return(&[], 12), 0.0);
        assert_eq!(annualized_return(&[-1.5, 0.1], 12), -1.0);
    }

    #[test]
    fn test_annualized_volatility() {
        assert_eq!(annualized_volatility(&[0.05], 12), 0.0);
        let returns = [0.01, -0.01, 0.01, -0.01];
        let sample_sd = (4.0 * 0.0001 / 3.0_f64).sqrt();
        assert_close(annualized_volatility(&returns, 12), sample_sd * 12.0_f64.sqrt());
    }

    #[test]
    fn test_drawdown_series() {
        let dd = drawdown_series(&[0.10, -0.20, 0.05]);
        assert_eq!(dd.len(), 3);
        assert_close(dd[0], 0.0);
        assert_close(dd[1], -0.20);
        assert_close(dd[2], 1.1 * 0.8 * 1.05 / 1.1 - 1.0);
        assert_close(max_drawdown(&dd), -0.20);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_drawdown_from_first_period_loss() {
        // 起始值 1 計入峰值，第一期虧損即為回撤
        let dd = drawdown_series(&[-0.10]);
        assert_close(dd[0], -0.10);
    }

    #[test]
    fn test_var_and_cvar() {
        let returns: Vec<f64> = (1..=20).map(|i| i as f64 / 100.0 - 0.10).collect();
        // n = 20，尾部索引 floor(0.05 * 20) = 1
        assert_close(value_at_risk(&returns), 0.08);
        assert_close(conditional_var(&returns), 0.085);
        assert_eq!(value_at_risk(&[]), 0.0);
        assert_eq!(conditional_var(&[]), 0.0);
    }

    #[test]
    fn test_ratios_degenerate_inputs() {
        assert_eq!(sharpe_ratio(0.1, 0.0, RISK_FREE_RATE), 0.0);
        assert_eq!(calmar_ratio(0.1, 0.0), 0.0);
        assert_eq!(sortino_ratio(&[0.01, 0.02], &EngineSettings::default()), 0.0);
        assert_close(calmar_ratio(0.1, -0.2), 0.5);
    }

    #[test]
    fn test_portfolio_monthly_returns_weighted() {
        let data = dataset(&[("SPY", vec![0.02, -0.01]), ("AGG", vec![0.00, 0.01])]);
        let holdings = [holding("SPY", 60.0), holding("AGG", 40.0)];
        let returns = portfolio_monthly_returns(&EngineSettings::default(), &holdings, &data);
        assert_close(returns[0], 0.012);
        assert_close(returns[1], -0.002);
    }

    #[test]
    fn test_partial_coverage_rescale_is_opt_in() {
        let data = dataset(&[("SPY", vec![0.02, -0.01])]);
        let holdings = [holding("SPY", 50.0), holding("NODATA", 50.0)];

        let plain = portfolio_monthly_returns(&EngineSettings::default(), &holdings, &data);
        assert_close(plain[0], 0.01);

        let settings = EngineSettings {
            rescale_partial_coverage: true,
            ..EngineSettings::default()
        };
        let rescaled = portfolio_monthly_returns(&settings, &holdings, &data);
        assert_close(rescaled[0], 0.02);
    }

    #[test]
    fn test_proxy_ticker_series_is_used() {
        let data = dataset(&[("VTI", vec![0.03, 0.01])]);
        let mut h = holding("FXAIX", 100.0);
        h.proxy_ticker = Some("VTI".into());
        let returns = portfolio_monthly_returns(&EngineSettings::default(), &[h], &data);
        assert_close(returns[0], 0.03);
    }

    #[test]
    fn test_mismatched_series_is_excluded() {
        let mut data = dataset(&[("SPY", vec![0.02, 0.01])]);
        data.returns.insert("BAD".into(), vec![0.5]);
        let returns =
            portfolio_monthly_returns(&EngineSettings::default(), &[holding("BAD", 100.0)], &data);
        assert_eq!(returns, vec![0.0, 0.0]);
    }

    #[test]
    fn test_portfolio_volatility_single_asset_matches_series() {
        let series = vec![0.02, -0.01, 0.03, 0.00];
        let data = dataset(&[("SPY", series.clone())]);
        let vol = portfolio_volatility(&EngineSettings::default(), &[holding("SPY", 100.0)], &data);
        assert_close(vol, annualized_volatility(&series, 12));
    }

    #[test]
    fn test_calculate_all_metrics_empty() {
        let metrics = calculate_all_metrics(&[], &ReturnsData::default());
        assert_eq!(metrics, PortfolioMetrics::default());
    }

    #[test]
    fn test_calculate_all_metrics_consistency() {
        let data = dataset(&[("SPY", vec![0.05, -0.10, 0.03, -0.02, 0.04, 0.01])]);
        let metrics = calculate_all_metrics(&[holding("SPY", 100.0)], &data);

        assert_eq!(metrics.monthly_returns.len(), 6);
        assert_eq!(metrics.drawdown_series.len(), 6);
        assert_eq!(metrics.max_drawdown, max_drawdown(&metrics.drawdown_series));
        assert!(metrics.drawdown_series.iter().all(|d| *d <= 0.0));
        assert_eq!(metrics.var95, 0.10);
        assert!(metrics.risk_score.is_none());
    }
}

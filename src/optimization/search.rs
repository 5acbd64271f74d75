//! 網格搜尋
//!
//! 依四種模式在已計算的網格中挑出最佳混合比例。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::grid::OptimizationResult;
use crate::domain_types::PortfolioMetrics;

/// 最大報酬模式的分數容許差
pub const SCORE_TOLERANCE: i32 = 3;
/// 最低風險模式的年化報酬容許差
pub const RETURN_TOLERANCE: f64 = 0.005;

/// 搜尋模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationMode {
    /// 分數相近（±3）下年化報酬最高
    MaxReturn,
    /// 報酬相近（±0.5%）下分數最低
    #[default]
    MinRisk,
    /// 最大回撤絕對值最小
    MinDrawdown,
    /// 分數最接近目標
    TargetScore,
}

impl OptimizationMode {
    pub const ALL: [OptimizationMode; 4] = [
        OptimizationMode::MaxReturn,
        OptimizationMode::MinRisk,
        OptimizationMode::MinDrawdown,
        OptimizationMode::TargetScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationMode::MaxReturn => "max-return",
            OptimizationMode::MinRisk => "min-risk",
            OptimizationMode::MinDrawdown => "min-drawdown",
            OptimizationMode::TargetScore => "target-score",
        }
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| format!("未知的最佳化模式: {}", s))
    }
}

/// 依序保留嚴格更好的點（平手時保留先出現者）
fn best_by<'a, F>(candidates: impl Iterator<Item = &'a OptimizationResult>, better: F) -> Option<&'a OptimizationResult>
where
    F: Fn(&OptimizationResult, &OptimizationResult) -> bool,
{
    candidates.fold(None, |best, point| match best {
        Some(current) if !better(point, current) => Some(current),
        _ => Some(point),
    })
}

/// 找出最佳網格點；沒有符合條件者回傳 `None`
pub fn find_optimal_point<'a>(
    grid: &'a [OptimizationResult],
    mode: OptimizationMode,
    current: &PortfolioMetrics,
    target_score: Option<u8>,
) -> Option<&'a OptimizationResult> {
    let current_score = i32::from(current.score_or_zero());

    match mode {
        OptimizationMode::MaxReturn => best_by(
            grid.iter()
                .filter(|p| (i32::from(p.risk_score) - current_score).abs() <= SCORE_TOLERANCE),
            |a, b| a.metrics.annualized_return > b.metrics.annualized_return,
        ),
        OptimizationMode::MinRisk => best_by(
            grid.iter().filter(|p| {
                (p.metrics.annualized_return - current.annualized_return).abs() <= RETURN_TOLERANCE
            }),
            |a, b| a.risk_score < b.risk_score,
        ),
        OptimizationMode::MinDrawdown => best_by(grid.iter(), |a, b| {
            a.metrics.max_drawdown.abs() < b.metrics.max_drawdown.abs()
        }),
        OptimizationMode::TargetScore => {
            let target = i32::from(target_score?);
            best_by(grid.iter(), |a, b| {
                (i32::from(a.risk_score) - target).abs() < (i32::from(b.risk_score) - target).abs()
            })
        }
    }
}

/// 最佳混合比例（THIR + THLV 合計），找不到時為 0
pub fn find_optimal(
    grid: &[OptimizationResult],
    mode: OptimizationMode,
    current: &PortfolioMetrics,
    target_score: Option<u8>,
) -> u8 {
    find_optimal_point(grid, mode, current, target_score)
        .map(|point| point.thor_allocation)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn point(p: u8, score: u8, annual_return: f64, max_drawdown: f64) -> OptimizationResult {
        OptimizationResult {
            thor_allocation: p,
            thir_pct: f64::from(p) / 2.0,
            thlv_pct: f64::from(p) / 2.0,
            holdings: Vec::new(),
            metrics: PortfolioMetrics {
                annualized_return: annual_return,
                max_drawdown,
                risk_score: Some(score),
                ..PortfolioMetrics::default()
            },
            risk_score: score,
        }
    }

    fn grid() -> Vec<OptimizationResult> {
        vec![
            point(0, 60, 0.080, -0.30),
            point(1, 58, 0.085, -0.25),
            point(2, 57, 0.082, -0.20),
            point(3, 50, 0.079, -0.20),
            point(4, 40, 0.060, -0.15),
        ]
    }

    fn current(score: Option<u8>, annual_return: f64) -> PortfolioMetrics {
        PortfolioMetrics {
            annualized_return: annual_return,
            risk_score: score,
            ..PortfolioMetrics::default()
        }
    }

    #[test]
    fn test_max_return_within_score_band() {
        // 分數 57..=63 的點中報酬最高者為 p=1
        assert_eq!(find_optimal(&grid(), OptimizationMode::MaxReturn, &current(Some(60), 0.08), None), 1);
    }

    #[test]
    fn test_max_return_no_candidate() {
        assert_eq!(find_optimal(&grid(), OptimizationMode::MaxReturn, &current(Some(90), 0.08), None), 0);
    }

    #[test]
    fn test_missing_current_score_treated_as_zero() {
        assert_eq!(find_optimal(&grid(), OptimizationMode::MaxReturn, &current(None, 0.08), None), 0);
    }

    #[test]
    fn test_min_risk_within_return_band() {
        // 報酬 0.075..=0.085 的點中分數最低者為 p=3
        assert_eq!(find_optimal(&grid(), OptimizationMode::MinRisk, &current(Some(60), 0.08), None), 3);
    }

    #[test]
    fn test_min_drawdown_first_on_ties() {
        let mut g = grid();
        g[4].metrics.max_drawdown = -0.20;
        assert_eq!(find_optimal(&g, OptimizationMode::MinDrawdown, &current(None, 0.0), None), 2);
    }

    #[rstest]
    #[case(Some(50), 3)]
    #[case(Some(45), 3)]
    #[case(Some(1), 4)]
    #[case(Some(100), 0)]
    #[case(None, 0)]
    fn test_target_score(#[case] target: Option<u8>, #[case] expected: u8) {
        assert_eq!(
            find_optimal(&grid(), OptimizationMode::TargetScore, &current(Some(60), 0.08), target),
            expected
        );
    }

    #[test]
    fn test_empty_grid() {
        for mode in OptimizationMode::ALL {
            assert_eq!(find_optimal(&[], mode, &current(Some(50), 0.05), Some(50)), 0);
        }
    }

    #[test]
    fn test_mode_parsing_and_serde() {
        for mode in OptimizationMode::ALL {
            assert_eq!(mode.as_str().parse::<OptimizationMode>(), Ok(mode));
            assert_eq!(serde_json::to_value(mode).unwrap(), mode.as_str());
        }
        assert_eq!("MIN_DRAWDOWN".parse::<OptimizationMode>(), Ok(OptimizationMode::MinDrawdown));
        assert!("fastest".parse::<OptimizationMode>().is_err());
    }
}

mod common;

use portfolio_analyzer::config::TickerPolicy;
use portfolio_analyzer::domain_types::{HoldingType, PortfolioMetrics, ReturnsData};
use portfolio_analyzer::risk::engine::{annualized_volatility, drawdown_series, max_drawdown, portfolio_volatility};
use portfolio_analyzer::risk::{
    calculate_all_metrics, calculate_risk_score, normalize_to_internal, resolve_proxies, EngineSettings,
};
use proptest::prelude::*;
use rstest::rstest;

use common::{growth_portfolio, holding, sample_returns};

#[test]
fn test_empty_inputs_produce_zero_metrics() {
    let metrics = calculate_all_metrics(&[], &ReturnsData::default());
    assert_eq!(metrics, PortfolioMetrics::default());

    let score = calculate_risk_score(&[], &metrics);
    assert!((1..=100).contains(&score));
}

#[test]
fn test_uncovered_holdings_yield_flat_returns() {
    let data = sample_returns();
    let metrics = calculate_all_metrics(&[holding("ZZZZ", 100.0, HoldingType::Stock)], &data);
    assert_eq!(metrics.monthly_returns, vec![0.0; data.len()]);
    assert_eq!(metrics.max_drawdown, 0.0);
    assert_eq!(metrics.volatility, 0.0);
}

#[test]
fn test_metrics_are_finite_for_sample_portfolio() {
    let metrics = calculate_all_metrics(&growth_portfolio(), &sample_returns());
    let values = [
        metrics.annualized_return,
        metrics.volatility,
        metrics.max_drawdown,
        metrics.sharpe_ratio,
        metrics.sortino_ratio,
        metrics.calmar_ratio,
        metrics.var95,
        metrics.cvar95,
    ];
    assert!(values.iter().all(|v| v.is_finite()));
    assert!(metrics.max_drawdown <= 0.0);
    assert!(metrics.cvar95 >= metrics.var95);
}

#[test]
fn test_covariance_volatility_matches_series_volatility() {
    let data = sample_returns();
    let holdings = growth_portfolio();
    let settings = EngineSettings::default();

    let metrics = calculate_all_metrics(&holdings, &data);
    let from_series = annualized_volatility(&metrics.monthly_returns, settings.periods_per_year);
    let from_covariance = portfolio_volatility(&settings, &holdings, &data);
    assert!((from_series - from_covariance).abs() < 1e-9);
}

#[test]
fn test_proxy_resolution_feeds_metrics() {
    let data = sample_returns();
    let policy = TickerPolicy::builtin();
    let holdings = vec![holding("SWVXX", 100.0, HoldingType::Cash)];

    let resolved = resolve_proxies(&policy, &holdings, &data);
    assert_eq!(resolved[0].data_ticker(), "BIL");

    let metrics = calculate_all_metrics(&resolved, &data);
    assert!(metrics.monthly_returns.iter().all(|r| (r - 0.003).abs() < 1e-12));
}

#[test]
fn test_score_is_deterministic() {
    let data = sample_returns();
    let holdings = growth_portfolio();
    let first = calculate_risk_score(&holdings, &calculate_all_metrics(&holdings, &data));
    let second = calculate_risk_score(&holdings, &calculate_all_metrics(&holdings, &data));
    assert_eq!(first, second);
}

#[rstest]
#[case(1.0, "nitrogen", 1)]
#[case(99.0, "nitrogen", 99)]
#[case(1.0, "stratifi", 1)]
#[case(10.0, "stratifi", 99)]
#[case(42.0, "unknown", 42)]
fn test_provider_normalization_endpoints(#[case] score: f64, #[case] provider: &str, #[case] expected: i32) {
    assert_eq!(normalize_to_internal(score, provider), expected);
}

proptest! {
    #[test]
    fn prop_max_drawdown_is_series_minimum(returns in prop::collection::vec(-0.5f64..0.5, 0..60)) {
        let series = drawdown_series(&returns);
        prop_assert_eq!(series.len(), returns.len());
        prop_assert!(series.iter().all(|d| *d <= 0.0));

        let expected = series.iter().copied().fold(0.0, f64::min);
        prop_assert_eq!(max_drawdown(&series), expected);
    }

    #[test]
    fn prop_score_in_range(
        annualized_return in -1.0f64..1.0,
        volatility in 0.0f64..1.0,
        max_drawdown in -1.0f64..0.0,
        var95 in 0.0f64..0.5,
        equity in 0.0f64..100.0,
    ) {
        let holdings = vec![
            holding("SPY", equity, HoldingType::Etf),
            holding("AGG", 100.0 - equity, HoldingType::Bond),
        ];
        let metrics = PortfolioMetrics {
            annualized_return,
            volatility,
            max_drawdown,
            var95,
            ..PortfolioMetrics::default()
        };
        let score = calculate_risk_score(&holdings, &metrics);
        prop_assert!((1..=100).contains(&score));
        prop_assert_eq!(score, calculate_risk_score(&holdings, &metrics));
    }
}

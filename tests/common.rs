#![allow(dead_code)]

use portfolio_analyzer::domain_types::{Holding, HoldingType, ReturnsData};
use std::collections::HashMap;

/// 24 個月的測試報酬矩陣（含 THIR / THLV）
pub fn sample_returns() -> ReturnsData {
    let dates: Vec<String> = (0..24).map(|i| format!("{}-{:02}", 2022 + i / 12, i % 12 + 1)).collect();
    let wave = |amplitude: f64, drift: f64, phase: usize| -> Vec<f64> {
        (0..24)
            .map(|i| drift + amplitude * (((i + phase) % 7) as f64 - 3.0) / 3.0)
            .collect()
    };

    let mut returns = HashMap::new();
    returns.insert("SPY".to_string(), wave(0.05, 0.008, 0));
    returns.insert("QQQ".to_string(), wave(0.07, 0.010, 2));
    returns.insert("AGG".to_string(), wave(0.01, 0.002, 4));
    returns.insert("VTI".to_string(), wave(0.05, 0.007, 1));
    returns.insert("BIL".to_string(), vec![0.003; 24]);
    returns.insert("THIR".to_string(), wave(0.02, 0.006, 3));
    returns.insert("THLV".to_string(), wave(0.015, 0.005, 5));
    ReturnsData::new(dates, returns)
}

pub fn holding(ticker: &str, allocation: f64, holding_type: HoldingType) -> Holding {
    Holding::new(ticker, allocation, holding_type)
}

pub fn growth_portfolio() -> Vec<Holding> {
    vec![
        holding("SPY", 50.0, HoldingType::Etf),
        holding("QQQ", 30.0, HoldingType::Etf),
        holding("AGG", 20.0, HoldingType::Bond),
    ]
}

pub fn returns_json(data: &ReturnsData) -> String {
    serde_json::to_string(data).unwrap()
}

pub const CATALOG_JSON: &str = r#"{
    "templates": [{
        "id": "classic-60-40",
        "name": "Classic 60/40",
        "description": "Stocks and bonds",
        "equity": 60, "bonds": 40, "other": 0, "expectedRisk": 55,
        "holdings": [
            {"ticker": "SPY", "name": "S&P 500", "allocation": 60, "type": "etf"},
            {"ticker": "AGG", "name": "Agg Bond", "allocation": 40, "type": "bond"}
        ]
    }],
    "tickerLookup": {
        "SPY": {"ticker": "SPY", "name": "SPDR S&P 500 ETF", "type": "etf"},
        "AGG": {"ticker": "AGG", "name": "iShares Core US Aggregate Bond", "type": "bond"},
        "QQQ": {"ticker": "QQQ", "name": "Invesco QQQ Trust", "type": "etf", "sector": "Technology"}
    }
}"#;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Holding, HoldingType};

/// 代號中繼資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub ticker: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl TickerInfo {
    /// 無法辨識的類型字串視為 ETF
    pub fn holding_type(&self) -> HoldingType {
        self.kind.parse().unwrap_or_default()
    }
}

/// 投資組合範本，供手動輸入時快速帶入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub equity: f64,
    pub bonds: f64,
    pub other: f64,
    pub expected_risk: f64,
    pub holdings: Vec<Holding>,
}

/// 範本與代號查詢表（對應 `tickers.json`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerCatalog {
    #[serde(default)]
    pub templates: Vec<PortfolioTemplate>,
    #[serde(default)]
    pub ticker_lookup: HashMap<String, TickerInfo>,
}

impl TickerCatalog {
    pub fn template(&self, id: &str) -> Option<&PortfolioTemplate> {
        self.templates.iter().find(|t| t.id.eq_ignore_ascii_case(id))
    }

    pub fn lookup(&self, ticker: &str) -> Option<&TickerInfo> {
        self.ticker_lookup.get(&ticker.to_uppercase())
    }

    /// 以查詢表補齊名稱、類型與產業；已有名稱者保留原值
    pub fn enrich(&self, holdings: &mut [Holding]) {
        for holding in holdings.iter_mut() {
            let Some(info) = self.lookup(&holding.ticker) else {
                continue;
            };
            if holding.name.is_empty() {
                holding.name = info.name.clone();
            }
            holding.holding_type = info.holding_type();
            if holding.sector.is_none() {
                holding.sector = info.sector.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TickerCatalog {
        let json = r#"{
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
                "AAPL": {"ticker": "AAPL", "name": "Apple Inc.", "type": "stock", "sector": "Technology"},
                "AGG": {"ticker": "AGG", "name": "iShares Core US Aggregate Bond", "type": "bond"}
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_template_lookup_case_insensitive() {
        let catalog = catalog();
        let template = catalog.template("CLASSIC-60-40").unwrap();
        assert_eq!(template.holdings.len(), 2);
        assert_eq!(template.expected_risk, 55.0);
    }

    #[test]
    fn test_enrich_fills_metadata() {
        let catalog = catalog();
        let mut holdings = vec![
            Holding::new("AAPL", 50.0, HoldingType::Etf),
            Holding::new("AGG", 40.0, HoldingType::Etf).with_name("My bonds"),
            Holding::new("ZZZ", 10.0, HoldingType::Etf),
        ];
        catalog.enrich(&mut holdings);

        assert_eq!(holdings[0].name, "Apple Inc.");
        assert_eq!(holdings[0].holding_type, HoldingType::Stock);
        assert_eq!(holdings[0].sector.as_deref(), Some("Technology"));
        assert_eq!(holdings[1].name, "My bonds");
        assert_eq!(holdings[1].holding_type, HoldingType::Bond);
        assert_eq!(holdings[2].name, "");
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 持倉類型枚舉
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum HoldingType {
    #[default]
    Etf,        // 指數股票型基金
    MutualFund, // 共同基金
    Stock,      // 個股
    Bond,       // 債券
    Cash,       // 現金
}

impl HoldingType {
    /// 是否計入股票曝險（個股與 ETF）
    pub fn is_equity(&self) -> bool {
        matches!(self, HoldingType::Stock | HoldingType::Etf)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingType::Etf => "etf",
            HoldingType::MutualFund => "mutual_fund",
            HoldingType::Stock => "stock",
            HoldingType::Bond => "bond",
            HoldingType::Cash => "cash",
        }
    }
}

impl fmt::Display for HoldingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HoldingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "etf" => Ok(HoldingType::Etf),
            "mutual_fund" | "mutual fund" | "fund" => Ok(HoldingType::MutualFund),
            "stock" => Ok(HoldingType::Stock),
            "bond" => Ok(HoldingType::Bond),
            "cash" => Ok(HoldingType::Cash),
            other => Err(format!("未知的持倉類型: {}", other)),
        }
    }
}

/// 單一持倉
///
/// `allocation` 為 0-100 的百分比。`proxy_ticker` 由代理解析器填入，
/// 表示該持倉的歷史報酬改用另一個代號的序列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    pub allocation: f64,
    #[serde(rename = "type", default)]
    pub holding_type: HoldingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_ticker: Option<String>,
}

impl Holding {
    /// 創建新的持倉，代號統一轉為大寫
    pub fn new(ticker: impl Into<String>, allocation: f64, holding_type: HoldingType) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            name: String::new(),
            allocation,
            holding_type,
            sector: None,
            proxy_ticker: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// 計算時實際查詢報酬序列的代號
    pub fn data_ticker(&self) -> &str {
        self.proxy_ticker.as_deref().unwrap_or(&self.ticker)
    }

    /// 權重（小數）
    pub fn weight(&self) -> f64 {
        self.allocation / 100.0
    }
}

/// 持倉配置總和
pub fn total_allocation(holdings: &[Holding]) -> f64 {
    holdings.iter().map(|h| h.allocation).sum()
}

/// 四捨五入到一位小數
pub fn round_allocation(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//! 代號政策資料表
//!
//! 已知代號、PDF 結構標記、樣板字、現金等價代號與代理對照表都是政策資料，
//! 預設值在編譯期由 `config/ticker_policy.toml` 產生，執行期可用
//! [`TickerPolicy::from_file`] 以外部檔案覆寫。

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain_types::HoldingType;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/ticker_policy_generated.rs"));
}

/// 政策資料表錯誤
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("政策檔讀取錯誤: {0}")]
    IoError(#[from] std::io::Error),

    #[error("政策檔解析錯誤: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("無效的持倉類型: {0}")]
    InvalidHoldingType(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// 內建政策（由編譯期產生的資料表建立）
static BUILTIN: Lazy<Arc<TickerPolicy>> = Lazy::new(|| Arc::new(TickerPolicy::from_generated()));

/// 解析器與代理解析器共用的政策資料
#[derive(Debug, Clone, PartialEq)]
pub struct TickerPolicy {
    pub known_tickers: HashSet<String>,
    pub pdf_structural_tokens: HashSet<String>,
    pub boilerplate_words: HashSet<String>,
    pub money_market_tickers: HashSet<String>,
    pub cash_sweep_phrases: Vec<String>,
    pub cash_equivalent_ticker: String,
    pub cash_equivalent_name: String,
    pub explicit_proxies: HashMap<String, String>,
    /// 依序比對的產業關鍵字
    pub sector_proxies: Vec<(String, String)>,
    pub type_proxies: HashMap<HoldingType, String>,
    pub fallback_proxy: String,
}

fn to_set(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl TickerPolicy {
    /// 取得內建政策
    pub fn builtin() -> Arc<TickerPolicy> {
        Arc::clone(&BUILTIN)
    }

    fn from_generated() -> Self {
        Self {
            known_tickers: to_set(generated::KNOWN_TICKERS),
            pdf_structural_tokens: to_set(generated::PDF_STRUCTURAL_TOKENS),
            boilerplate_words: to_set(generated::BOILERPLATE_WORDS),
            money_market_tickers: to_set(generated::MONEY_MARKET_TICKERS),
            cash_sweep_phrases: generated::CASH_SWEEP_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cash_equivalent_ticker: generated::CASH_EQUIVALENT_TICKER.to_string(),
            cash_equivalent_name: generated::CASH_EQUIVALENT_NAME.to_string(),
            explicit_proxies: generated::EXPLICIT_PROXIES
                .iter()
                .map(|(t, p)| (t.to_string(), p.to_string()))
                .collect(),
            sector_proxies: generated::SECTOR_PROXIES
                .iter()
                .map(|(k, p)| (k.to_string(), p.to_string()))
                .collect(),
            // 產生的類型名稱來自同一份檔案，無法辨識者直接略過
            type_proxies: generated::TYPE_PROXIES
                .iter()
                .filter_map(|(t, p)| t.parse::<HoldingType>().ok().map(|ht| (ht, p.to_string())))
                .collect(),
            fallback_proxy: generated::FALLBACK_PROXY.to_string(),
        }
    }

    /// 從 TOML 字串載入政策
    pub fn from_toml_str(content: &str) -> PolicyResult<Self> {
        let file: PolicyFile = toml::from_str(content)?;
        file.try_into()
    }

    /// 從 TOML 檔案載入政策
    pub fn from_file(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn is_known(&self, ticker: &str) -> bool {
        self.known_tickers.contains(ticker)
    }

    pub fn is_money_market(&self, ticker: &str) -> bool {
        self.money_market_tickers.contains(ticker)
    }

    /// 大寫後的行是否包含任一現金掃單片語
    pub fn is_cash_sweep_line(&self, line: &str) -> bool {
        let upper = line.to_uppercase();
        self.cash_sweep_phrases.iter().any(|p| upper.contains(p.as_str()))
    }
}

impl Default for TickerPolicy {
    fn default() -> Self {
        BUILTIN.as_ref().clone()
    }
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    tickers: TickerTables,
    cash: CashTables,
    proxy: ProxyTables,
}

#[derive(Debug, Deserialize)]
struct TickerTables {
    known: Vec<String>,
    pdf_structural: Vec<String>,
    boilerplate: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CashTables {
    equivalent_ticker: String,
    equivalent_name: String,
    money_market: Vec<String>,
    sweep_phrases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyTables {
    explicit: Vec<ExplicitProxy>,
    sector: Vec<SectorProxy>,
    by_type: Vec<TypeProxy>,
    fallback: String,
}

#[derive(Debug, Deserialize)]
struct ExplicitProxy {
    ticker: String,
    proxy: String,
}

#[derive(Debug, Deserialize)]
struct SectorProxy {
    keyword: String,
    proxy: String,
}

#[derive(Debug, Deserialize)]
struct TypeProxy {
    holding_type: String,
    proxy: String,
}

fn upper_set(values: Vec<String>) -> HashSet<String> {
    values.into_iter().map(|v| v.trim().to_uppercase()).collect()
}

impl TryFrom<PolicyFile> for TickerPolicy {
    type Error = PolicyError;

    fn try_from(file: PolicyFile) -> PolicyResult<Self> {
        let mut type_proxies = HashMap::new();
        for entry in file.proxy.by_type {
            let holding_type = entry
                .holding_type
                .parse::<HoldingType>()
                .map_err(|_| PolicyError::InvalidHoldingType(entry.holding_type.clone()))?;
            type_proxies.insert(holding_type, entry.proxy.to_uppercase());
        }

        Ok(Self {
            known_tickers: upper_set(file.tickers.known),
            pdf_structural_tokens: upper_set(file.tickers.pdf_structural),
            boilerplate_words: upper_set(file.tickers.boilerplate),
            money_market_tickers: upper_set(file.cash.money_market),
            cash_sweep_phrases: file
                .cash
                .sweep_phrases
                .into_iter()
                .map(|p| p.to_uppercase())
                .collect(),
            cash_equivalent_ticker: file.cash.equivalent_ticker.trim().to_uppercase(),
            cash_equivalent_name: file.cash.equivalent_name,
            explicit_proxies: file
                .proxy
                .explicit
                .into_iter()
                .map(|p| (p.ticker.to_uppercase(), p.proxy.to_uppercase()))
                .collect(),
            sector_proxies: file
                .proxy
                .sector
                .into_iter()
                .map(|p| (p.keyword.to_lowercase(), p.proxy.to_uppercase()))
                .collect(),
            type_proxies,
            fallback_proxy: file.proxy.fallback.to_uppercase(),
        })
    }
}

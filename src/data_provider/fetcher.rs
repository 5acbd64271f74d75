//! 按需取得缺少的報酬序列
//!
//! 內建資料集沒有的代號可透過 HTTP 端點補齊：POST `{ tickers, dates }`，
//! 回應 `{ returns }`。取得失敗一律不致命，分析改用代理或排除該持倉。

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Months, NaiveDate};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::error::{FetchError, FetchResult};
use crate::config::FetchConfig;
use crate::domain_types::ReturnsData;

/// 單次請求的代號上限
pub const MAX_TICKERS_PER_REQUEST: usize = 50;

/// 報酬序列取得特性
#[async_trait]
pub trait ReturnsFetcher: Send + Sync {
    /// 取得與 `dates` 對齊的月報酬序列；沒有資料的代號不會出現在結果中
    async fn fetch(&self, tickers: &[String], dates: &[String]) -> FetchResult<HashMap<String, Vec<f64>>>;
}

#[derive(Debug, Serialize)]
struct FetchRequest<'a> {
    tickers: &'a [String],
    dates: &'a [String],
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    returns: HashMap<String, Vec<f64>>,
}

/// 透過 HTTP 端點取得報酬序列
#[derive(Debug, Clone)]
pub struct HttpReturnsFetcher {
    client: Client,
    endpoint: String,
    timeout: Duration,
    max_tickers: usize,
}

impl HttpReturnsFetcher {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        if !config.enabled {
            return Err(FetchError::Disabled("fetch"));
        }
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
            max_tickers: config.max_tickers.clamp(1, MAX_TICKERS_PER_REQUEST),
        })
    }

    async fn post_batch(&self, tickers: &[String], dates: &[String]) -> FetchResult<HashMap<String, Vec<f64>>> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&FetchRequest { tickers, dates })
            .send();

        let response = match timeout(self.timeout, request).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::TimeoutError(self.timeout.as_secs())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::StatusError(status.as_u16()));
        }

        let body: FetchResponse = response.json().await?;
        debug!("批次 {:?} 取得 {} 個序列", tickers, body.returns.len());
        Ok(body.returns)
    }
}

#[async_trait]
impl ReturnsFetcher for HttpReturnsFetcher {
    async fn fetch(&self, tickers: &[String], dates: &[String]) -> FetchResult<HashMap<String, Vec<f64>>> {
        if tickers.is_empty() || dates.is_empty() {
            return Ok(HashMap::new());
        }

        let batches = tickers.chunks(self.max_tickers).map(|batch| self.post_batch(batch, dates));
        let results = join_all(batches).await;

        let mut merged = HashMap::new();
        let mut last_error = None;
        for result in results {
            match result {
                Ok(returns) => merged.extend(returns),
                Err(err) => {
                    warn!("報酬序列批次取得失敗: {}", err);
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if merged.is_empty() => Err(err),
            _ => Ok(merged),
        }
    }
}

/// 取得缺少的序列並併入資料集，回傳實際合併的數量
///
/// 任何錯誤只記錄警告，不中斷分析流程。
pub async fn fetch_missing(fetcher: &dyn ReturnsFetcher, data: &mut ReturnsData, tickers: &[String]) -> usize {
    if tickers.is_empty() || data.is_empty() {
        return 0;
    }

    match fetcher.fetch(tickers, &data.dates).await {
        Ok(fetched) => {
            let merged = data.merge(fetched);
            info!("按需取得 {} 個代號，合併 {} 個", tickers.len(), merged);
            merged
        }
        Err(err) => {
            warn!("按需取得報酬序列失敗，改用代理: {}", err);
            0
        }
    }
}

/// 月線收盤資料（`t` 為毫秒時間戳，`c` 為調整後收盤價）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MonthlyBar {
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    #[serde(rename = "c")]
    pub close: Option<f64>,
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `YYYY-MM` 的前一個月
pub fn previous_month(key: &str) -> Option<String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d").ok()?;
    first.checked_sub_months(Months::new(1)).map(month_key)
}

/// 將月線收盤價轉為與日期格線對齊的月報酬
///
/// 每期報酬為 (本月收盤 - 上月收盤) / 上月收盤；任一收盤缺少或上月不為正時為 0。
/// 同一月份有多根 K 棒時以最後一根為準。
pub fn align_monthly_returns(bars: &[MonthlyBar], dates: &[String]) -> Vec<f64> {
    let mut close_by_month: HashMap<String, f64> = HashMap::new();
    for bar in bars {
        let (Some(close), Some(time)) = (bar.close, DateTime::from_timestamp_millis(bar.timestamp_ms)) else {
            continue;
        };
        close_by_month.insert(month_key(time.date_naive()), close);
    }

    dates
        .iter()
        .map(|date| {
            let current = close_by_month.get(date);
            let previous = previous_month(date).and_then(|key| close_by_month.get(&key));
            match (previous, current) {
                (Some(prev), Some(cur)) if *prev > 0.0 => (cur - prev) / prev,
                _ => 0.0,
            }
        })
        .collect()
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::Holding;

/// 歷史月報酬矩陣
///
/// `dates` 定義所有序列的對齊方式（`YYYY-MM`），`returns` 中每個序列
/// 必須與 `dates` 等長，長度不符的序列視同不存在。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnsData {
    pub dates: Vec<String>,
    pub returns: HashMap<String, Vec<f64>>,
}

impl ReturnsData {
    pub fn new(dates: Vec<String>, returns: HashMap<String, Vec<f64>>) -> Self {
        Self { dates, returns }
    }

    /// 期數
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// 取得與日期對齊的報酬序列
    pub fn series(&self, ticker: &str) -> Option<&[f64]> {
        let series = self.returns.get(ticker)?;
        if series.len() != self.dates.len() {
            warn!(
                "代號 {} 的報酬序列長度 {} 與日期數 {} 不一致，略過",
                ticker,
                series.len(),
                self.dates.len()
            );
            return None;
        }
        Some(series.as_slice())
    }

    pub fn has_series(&self, ticker: &str) -> bool {
        self.returns
            .get(ticker)
            .map(|s| s.len() == self.dates.len())
            .unwrap_or(false)
    }

    /// 找出沒有直接序列的持倉代號（已設定代理者除外）
    pub fn missing_tickers(&self, holdings: &[Holding]) -> Vec<String> {
        let mut missing: Vec<String> = holdings
            .iter()
            .filter(|h| !self.has_series(h.data_ticker()))
            .map(|h| h.ticker.clone())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// 合併外部取得的序列，僅接受長度正確者，回傳實際合併的數量
    pub fn merge(&mut self, fetched: HashMap<String, Vec<f64>>) -> usize {
        let mut merged = 0;
        for (ticker, series) in fetched {
            if series.len() != self.dates.len() {
                warn!(
                    "取得的 {} 報酬序列長度 {} 不符，未合併",
                    ticker,
                    series.len()
                );
                continue;
            }
            self.returns.insert(ticker.to_uppercase(), series);
            merged += 1;
        }
        merged
    }
}

//! CSV 對帳單解析
//!
//! 依序嘗試：依標題欄位解析、無標題逐格掃描。兩者都找不到持倉時由
//! 上層改用自由文字抽取。

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::error::StatementResult;
use super::numeric::{cell_percentage, parse_stripped};
use super::ticker_filter::{first_token, looks_like_ticker};
use crate::config::TickerPolicy;
use crate::domain_types::{round_allocation, Holding, HoldingType};

/// 代號欄位候選名稱（依優先順序）
const TICKER_COLUMNS: &[&str] = &[
    "ticker", "symbol", "fund", "etf", "holding", "security", "name", "description", "account",
];

/// 配置比例欄位候選名稱（依優先順序）
const ALLOCATION_COLUMNS: &[&str] = &[
    "weight", "allocation", "percent", "pct", "%", "portfolio %", "port %", "weighting",
];

/// 市值欄位候選名稱（依優先順序）
const VALUE_COLUMNS: &[&str] = &[
    "value", "market_value", "market value", "amount", "balance", "current value", "total value",
    "mkt value", "market val",
];

/// 無標題掃描時視為金額的最小值
const MIN_HEADERLESS_VALUE: f64 = 100.0;

/// 讀取所有非空白列
pub fn read_rows(text: &str) -> StatementResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(rows)
}

/// 以候選名稱尋找欄位：依候選順序檢查，第一個包含該名稱的標題勝出
fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    candidates
        .iter()
        .find_map(|candidate| lower.iter().position(|h| h.contains(candidate)))
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn money(text: &str) -> Option<f64> {
    parse_stripped(text, &['$', ','])
}

/// 第一列為標題的解析方式
pub fn parse_with_headers(policy: &TickerPolicy, rows: &[Vec<String>]) -> Vec<Holding> {
    let Some((headers, data)) = rows.split_first() else {
        return Vec::new();
    };
    if data.is_empty() {
        return Vec::new();
    }

    let Some(ticker_col) = find_column(headers, TICKER_COLUMNS) else {
        debug!("找不到代號欄位，標題: {:?}", headers);
        return Vec::new();
    };
    let alloc_col = find_column(headers, ALLOCATION_COLUMNS);
    // 有配置比例欄位時忽略市值欄位
    let value_col = if alloc_col.is_none() {
        find_column(headers, VALUE_COLUMNS)
    } else {
        None
    };

    let total_value: f64 = value_col
        .map(|col| data.iter().filter_map(|row| money(cell(row, col))).sum())
        .unwrap_or(0.0);

    let mut holdings = Vec::new();
    for row in data {
        let ticker = first_token(cell(row, ticker_col));
        if !looks_like_ticker(policy, &ticker) {
            continue;
        }

        let allocation = match (alloc_col, value_col) {
            (Some(col), _) => parse_stripped(cell(row, col), &['%', ',']).unwrap_or(0.0),
            (None, Some(col)) if total_value > 0.0 => {
                money(cell(row, col)).map(|v| v / total_value * 100.0).unwrap_or(0.0)
            }
            _ => 0.0,
        };

        holdings.push(Holding::new(ticker, round_allocation(allocation), HoldingType::Etf));
    }
    holdings
}

/// 無標題逐格掃描：找出像代號的儲存格，再往右找百分比或金額
pub fn parse_headerless(policy: &TickerPolicy, rows: &[Vec<String>]) -> Vec<Holding> {
    let mut holdings = Vec::new();
    let mut seen = HashSet::new();
    let mut value_by_ticker: HashMap<String, f64> = HashMap::new();

    for row in rows {
        for (i, raw) in row.iter().enumerate() {
            let ticker = first_token(raw);
            if !looks_like_ticker(policy, &ticker) || seen.contains(&ticker) {
                continue;
            }

            let mut allocation = 0.0;
            let mut value = 0.0;
            for next in &row[i + 1..] {
                let next = next.trim();
                if let Some(pct) = cell_percentage(next) {
                    allocation = pct;
                    break;
                }
                // 後出現的金額覆蓋前者
                if let Some(num) = money(next).filter(|n| *n > MIN_HEADERLESS_VALUE) {
                    value = num;
                }
            }

            seen.insert(ticker.clone());
            if value > 0.0 {
                value_by_ticker.insert(ticker.clone(), value);
            }
            holdings.push(Holding::new(ticker, round_allocation(allocation), HoldingType::Etf));
        }
    }

    allocate_from_values(&mut holdings, &value_by_ticker);
    holdings
}

/// 沒有百分比的持倉依市值占比補上配置比例
pub fn allocate_from_values(holdings: &mut [Holding], value_by_ticker: &HashMap<String, f64>) {
    let total_value: f64 = value_by_ticker.values().sum();
    if total_value <= 0.0 {
        return;
    }
    for holding in holdings.iter_mut() {
        if holding.allocation != 0.0 {
            continue;
        }
        if let Some(value) = value_by_ticker.get(&holding.ticker).filter(|v| **v > 0.0) {
            holding.allocation = round_allocation(value / total_value * 100.0);
        }
    }
}

/// 執行 CSV 兩段式解析，讀取失敗時回傳空集合
pub fn parse_rows(policy: &TickerPolicy, text: &str) -> Vec<Holding> {
    let rows = match read_rows(text) {
        Ok(rows) => rows,
        Err(err) => {
            warn!("CSV 讀取失敗: {}", err);
            return Vec::new();
        }
    };

    let holdings = parse_with_headers(policy, &rows);
    if !holdings.is_empty() {
        debug!("依標題解析出 {} 筆持倉", holdings.len());
        return holdings;
    }

    let holdings = parse_headerless(policy, &rows);
    debug!("無標題掃描解析出 {} 筆持倉", holdings.len());
    holdings
}

//! 自由文字持倉抽取
//!
//! 用於 PDF 重建出的文字行，以及無法以 CSV 解析的純文字。
//! 先逐行找「代號 + 金額/百分比」的表格列，再找銀行掃單現金列，
//! 最後把現金併入現金等價持倉並補足配置比例。

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::csv_parser::allocate_from_values;
use super::numeric::{dollar_values, percentages};
use super::ticker_filter::{looks_like_ticker, text_candidate};
use crate::config::TickerPolicy;
use crate::domain_types::{round_allocation, total_allocation, Holding, HoldingType};

/// 視為市值（而非股數或價格）的最小金額
const MIN_MARKET_VALUE: f64 = 50.0;
/// 掃單現金的合理上限
const MAX_SWEEP_CASH: f64 = 10_000_000.0;
/// 配置比例合計低於此值時以現金等價補足
const FILL_THRESHOLD: f64 = 95.0;

/// 抽取過程的累積狀態
#[derive(Default)]
struct Extraction {
    holdings: Vec<Holding>,
    seen: HashSet<String>,
    value_by_ticker: HashMap<String, f64>,
    cash: f64,
}

/// 從文字中抽取持倉
pub fn extract_holdings(policy: &TickerPolicy, text: &str) -> Vec<Holding> {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let mut state = Extraction::default();

    scan_tabular_rows(policy, &lines, &mut state);
    scan_sweep_lines(policy, &lines, &mut state);
    finish(policy, state)
}

/// 截至第一個已知代號（不含）的詞數
fn until_known(policy: &TickerPolicy, tokens: &[&str]) -> Option<usize> {
    tokens
        .iter()
        .position(|t| text_candidate(t).is_some_and(|c| policy.is_known(&c)))
}

/// 表格列：代號後面跟著金額或百分比
///
/// 被接受的代號會吃掉它的上下文詞，避免同一列的描述字（如 "SPDR"）被誤判為代號。
fn scan_tabular_rows(policy: &TickerPolicy, lines: &[&str], state: &mut Extraction) {
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut t = 0;
        while t < tokens.len() {
            let idx = t;
            t += 1;

            let Some(candidate) = text_candidate(tokens[idx]) else { continue };
            if state.seen.contains(&candidate) {
                continue;
            }

            if policy.is_money_market(&candidate) {
                let values = dollar_values(line);
                let value = values
                    .iter()
                    .copied()
                    .find(|v| *v > MIN_MARKET_VALUE)
                    .or_else(|| values.first().copied());
                if let Some(value) = value.filter(|v| *v > 0.0) {
                    debug!("貨幣市場基金 {} 併入現金: {}", candidate, value);
                    state.cash += value;
                }
                state.seen.insert(candidate);
                continue;
            }

            if !looks_like_ticker(policy, &candidate) {
                continue;
            }
            let is_known = policy.is_known(&candidate);

            // 同一行遇到下一個已知代號即截斷；未截斷時才併入下一行（同樣截至已知代號）
            let rest = &tokens[idx + 1..];
            let boundary = until_known(policy, rest);
            let context = match boundary {
                Some(end) => rest[..end].join(" "),
                None => {
                    let next: Vec<&str> = lines
                        .get(i + 1)
                        .map(|l| l.split_whitespace().collect())
                        .unwrap_or_default();
                    let end = until_known(policy, &next).unwrap_or(next.len());
                    format!("{} {}", rest.join(" "), next[..end].join(" "))
                }
            };

            let dollars = dollar_values(&context);
            let pcts = percentages(&context);
            let has_money = !dollars.is_empty();
            let has_pct = !pcts.is_empty();
            let accepted = if is_known { has_money || has_pct } else { has_money && has_pct };
            if !accepted {
                continue;
            }

            // 最後一個百分比通常是「占帳戶比例」，第一個大於門檻的金額是市值
            let allocation = pcts.last().copied().unwrap_or(0.0);
            let value = dollars.iter().copied().find(|v| *v > MIN_MARKET_VALUE).unwrap_or(0.0);

            state.seen.insert(candidate.clone());
            if value > 0.0 {
                state.value_by_ticker.insert(candidate.clone(), value);
            }
            state
                .holdings
                .push(Holding::new(candidate, round_allocation(allocation), HoldingType::Etf));

            t = idx + 1 + boundary.unwrap_or(rest.len());
        }
    }
}

/// 銀行掃單列：只取第一個符合的行
fn scan_sweep_lines(policy: &TickerPolicy, lines: &[&str], state: &mut Extraction) {
    for line in lines {
        if !policy.is_cash_sweep_line(line) {
            continue;
        }
        let values = dollar_values(line);
        // 多個金額時第二個通常是期末餘額
        let Some(cash) = values.get(1).or_else(|| values.first()).copied() else {
            continue;
        };
        if cash > 0.0 && cash < MAX_SWEEP_CASH {
            debug!("掃單現金: {}", cash);
            state.cash += cash;
            return;
        }
    }
}

/// 現金併入、以市值補比例、不足部分以現金等價補足
fn finish(policy: &TickerPolicy, mut state: Extraction) -> Vec<Holding> {
    let cash_ticker = policy.cash_equivalent_ticker.as_str();

    if state.cash > 0.0 {
        if state.seen.contains(cash_ticker) {
            // 已有現金等價持倉時，現金併入其市值
            *state.value_by_ticker.entry(cash_ticker.to_string()).or_insert(0.0) += state.cash;
        } else {
            state.value_by_ticker.insert(cash_ticker.to_string(), state.cash);
            state.holdings.push(cash_holding(policy, 0.0));
        }
    }

    allocate_from_values(&mut state.holdings, &state.value_by_ticker);

    let total = total_allocation(&state.holdings);
    if !state.holdings.is_empty() && total > 0.0 && total < FILL_THRESHOLD {
        let shortfall = 100.0 - total;
        match state.holdings.iter_mut().find(|h| h.ticker == cash_ticker) {
            Some(existing) => existing.allocation = round_allocation(existing.allocation + shortfall),
            None => state.holdings.push(cash_holding(policy, round_allocation(shortfall))),
        }
    }

    state.holdings
}

fn cash_holding(policy: &TickerPolicy, allocation: f64) -> Holding {
    Holding::new(policy.cash_equivalent_ticker.as_str(), allocation, HoldingType::Etf)
        .with_name(policy.cash_equivalent_name.as_str())
}

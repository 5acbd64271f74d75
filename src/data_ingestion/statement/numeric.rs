//! 對帳單數值擷取
//!
//! 券商匯出的數字常帶有貨幣符號、千分位與尾隨文字，這裡統一以
//! 「取開頭的數字前綴」方式解析，無法解析者視為 `None`。

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("數字前綴正規式無效")
});

static DOLLAR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?([\d,]+\.\d{2})\b").expect("金額正規式無效"));

static PERCENTAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)\s*%").expect("百分比正規式無效"));

static CELL_PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\d.]+)\s*%$").expect("儲存格百分比正規式無效"));

/// 解析字串開頭的數字前綴，例如 `"12.5abc"` 得到 12.5
pub fn parse_leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// 去除指定字元後解析數字
pub fn parse_stripped(text: &str, strip: &[char]) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !strip.contains(c)).collect();
    parse_leading_number(&cleaned)
}

/// 擷取文字中所有看起來像金額的正數（須有兩位小數）
pub fn dollar_values(text: &str) -> Vec<f64> {
    DOLLAR_VALUE
        .captures_iter(text)
        .filter_map(|caps| parse_stripped(&caps[1], &[',']))
        .filter(|v| *v > 0.0)
        .collect()
}

/// 擷取文字中所有落在 (0, 100] 的百分比
pub fn percentages(text: &str) -> Vec<f64> {
    PERCENTAGE
        .captures_iter(text)
        .filter_map(|caps| parse_leading_number(&caps[1]))
        .filter(|v| *v > 0.0 && *v <= 100.0)
        .collect()
}

/// 整個儲存格是否為 `N%` 形式，是則回傳 N（無法解析的數字視為 0）
pub fn cell_percentage(cell: &str) -> Option<f64> {
    CELL_PERCENTAGE
        .captures(cell)
        .map(|caps| parse_leading_number(&caps[1]).unwrap_or(0.0))
}

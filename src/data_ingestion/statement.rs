//! 券商對帳單解析
//!
//! 將使用者上傳的 CSV 或 PDF 轉成持倉清單。解析器從不回傳 `Err`，
//! 也不會因輸入格式錯誤而 panic；找不到持倉時以使用者看得懂的訊息回報。

pub mod csv_parser;
pub mod error;
pub mod numeric;
pub mod pdf_reader;
pub mod text_extractor;
pub mod ticker_filter;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

pub use error::{StatementError, StatementResult};
pub use ticker_filter::looks_like_ticker;

use crate::config::TickerPolicy;
use crate::domain_types::Holding;

/// CSV 無法辨識持倉時的訊息
pub const CSV_NO_HOLDINGS: &str = "We couldn't find any holdings in this file. Try adding them manually below.";
/// 文字抽取無法辨識持倉時的訊息
pub const TEXT_NO_HOLDINGS: &str =
    "We couldn't find any holdings in this file. Try exporting as CSV or entering holdings manually.";
/// PDF 完全無法讀取時的訊息
pub const PDF_UNREADABLE: &str =
    "We couldn't read this PDF. Try exporting your statement as CSV instead, or enter holdings manually.";

/// 解析結果：持倉清單，或（清單為空時）錯誤訊息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub holdings: Vec<Holding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseResult {
    fn from_holdings(holdings: Vec<Holding>, empty_message: &str) -> Self {
        if holdings.is_empty() {
            Self::failure(empty_message)
        } else {
            Self { holdings, error: None }
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            holdings: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 對帳單解析器
#[derive(Debug, Clone)]
pub struct StatementParser {
    policy: Arc<TickerPolicy>,
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new(TickerPolicy::builtin())
    }
}

impl StatementParser {
    /// 使用指定政策建立解析器
    pub fn new(policy: Arc<TickerPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TickerPolicy {
        &self.policy
    }

    /// 解析 CSV 文字：標題解析、無標題掃描，最後以自由文字抽取
    #[instrument(skip_all, fields(bytes = text.len()))]
    pub fn parse_csv(&self, text: &str) -> ParseResult {
        let holdings = csv_parser::parse_rows(&self.policy, text);
        if !holdings.is_empty() {
            info!("CSV 解析完成，共 {} 筆持倉", holdings.len());
            return ParseResult::from_holdings(holdings, CSV_NO_HOLDINGS);
        }

        let holdings = text_extractor::extract_holdings(&self.policy, text);
        debug!("CSV 改用文字抽取，得到 {} 筆持倉", holdings.len());
        ParseResult::from_holdings(holdings, CSV_NO_HOLDINGS)
    }

    /// 同步解析 PDF
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn parse_pdf_blocking(&self, bytes: &[u8]) -> ParseResult {
        match pdf_reader::read_text(bytes) {
            Ok(text) => {
                let holdings = text_extractor::extract_holdings(&self.policy, &text);
                info!("PDF 解析完成，共 {} 筆持倉", holdings.len());
                ParseResult::from_holdings(holdings, TEXT_NO_HOLDINGS)
            }
            Err(err) => {
                warn!("PDF 解析失敗，改以純文字處理: {}", err);
                self.parse_as_text(bytes)
            }
        }
    }

    /// 非同步解析 PDF（在阻塞執行緒池上執行）
    pub async fn parse_pdf(&self, bytes: Vec<u8>) -> ParseResult {
        let parser = self.clone();
        match tokio::task::spawn_blocking(move || parser.parse_pdf_blocking(&bytes)).await {
            Ok(result) => result,
            Err(err) => {
                let err = StatementError::TaskError(err.to_string());
                error!("{}", err);
                ParseResult::failure(PDF_UNREADABLE)
            }
        }
    }

    /// 非 PDF 內容的後備處理：含逗號或 Tab 視為 CSV，否則走文字抽取
    fn parse_as_text(&self, bytes: &[u8]) -> ParseResult {
        let text = String::from_utf8_lossy(bytes);
        if text.trim().is_empty() {
            return ParseResult::failure(PDF_UNREADABLE);
        }
        if text.contains(',') || text.contains('\t') {
            return self.parse_csv(&text);
        }
        let holdings = text_extractor::extract_holdings(&self.policy, &text);
        ParseResult::from_holdings(holdings, TEXT_NO_HOLDINGS)
    }
}

/// 以內建政策解析 CSV
pub fn parse_csv(text: &str) -> ParseResult {
    StatementParser::default().parse_csv(text)
}

/// 以內建政策非同步解析 PDF
pub async fn parse_pdf(bytes: Vec<u8>) -> ParseResult {
    StatementParser::default().parse_pdf(bytes).await
}

/// 以內建政策同步解析 PDF
pub fn parse_pdf_blocking(bytes: &[u8]) -> ParseResult {
    StatementParser::default().parse_pdf_blocking(bytes)
}

//! 對帳單處理錯誤定義

use thiserror::Error;

/// 對帳單處理錯誤類型
///
/// 僅在解析器內部流動；對外一律轉成 [`super::ParseResult`] 的使用者訊息。
#[derive(Error, Debug)]
pub enum StatementError {
    #[error("CSV 解析錯誤: {0}")]
    CsvError(#[from] csv::Error),

    #[error("PDF 解析錯誤: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("背景任務失敗: {0}")]
    TaskError(String),
}

/// 對帳單處理結果類型
pub type StatementResult<T> = Result<T, StatementError>;

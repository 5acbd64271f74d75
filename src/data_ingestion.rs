//! 資料匯入模組
//!
//! 將使用者上傳的對帳單（CSV / PDF）解析成持倉清單，並在分析前驗證持倉。

pub mod holdings_validator;
pub mod statement;

pub use holdings_validator::{DataValidator, HoldingsReport, HoldingsValidationError, PortfolioValidator};
pub use statement::{parse_csv, parse_pdf, parse_pdf_blocking, ParseResult, StatementParser};

//! 持倉驗證器模組
//!
//! 在分析前確認持倉清單可用：至少一筆、代號不為空、配置比例為正、
//! 合計接近 100%、代號不重複。

pub mod error;
pub mod portfolio;
pub mod traits;

pub use error::{HoldingsValidationError, HoldingsValidationResult};
pub use portfolio::{HoldingValidator, HoldingsReport, PortfolioValidator, PARSED_TOLERANCE, SESSION_TOLERANCE};
pub use traits::DataValidator;

//! 持倉驗證錯誤定義

use serde::{Serialize, Serializer};
use thiserror::Error;

/// 持倉驗證錯誤
///
/// 訊息會直接顯示給使用者，因此使用英文。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HoldingsValidationError {
    #[error("Add at least one holding")]
    Empty,

    #[error("Allocations sum to {total:.1}%, must be ~100%")]
    AllocationSum { total: f64 },

    #[error("All holdings must have a ticker")]
    MissingTicker,

    #[error("{ticker}: allocation must be > 0")]
    NonPositiveAllocation { ticker: String },

    #[error("{ticker}: listed more than once")]
    DuplicateTicker { ticker: String },
}

// 序列化為顯示訊息
impl Serialize for HoldingsValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// 持倉驗證結果類型
pub type HoldingsValidationResult<T> = Result<T, HoldingsValidationError>;

//! 投資組合層級的持倉驗證

use serde::Serialize;
use std::collections::HashSet;

use super::error::{HoldingsValidationError, HoldingsValidationResult};
use super::traits::DataValidator;
use crate::domain_types::{total_allocation, Holding};

/// 手動編輯後的配置合計容許誤差（百分點）
pub const SESSION_TOLERANCE: f64 = 1.0;
/// 解析結果的配置合計容許誤差（百分點）
pub const PARSED_TOLERANCE: f64 = 2.0;

/// 單一持倉驗證：代號不可為空、配置比例須為正
#[derive(Debug, Default, Clone, Copy)]
pub struct HoldingValidator;

impl DataValidator<Holding> for HoldingValidator {
    fn validate_item(&self, item: &Holding) -> HoldingsValidationResult<()> {
        if item.ticker.trim().is_empty() {
            return Err(HoldingsValidationError::MissingTicker);
        }
        if !(item.allocation > 0.0) {
            return Err(HoldingsValidationError::NonPositiveAllocation {
                ticker: item.ticker.clone(),
            });
        }
        Ok(())
    }
}

/// 驗證報告
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsReport {
    pub errors: Vec<HoldingsValidationError>,
    pub total: f64,
    pub is_valid: bool,
}

impl HoldingsReport {
    /// 錯誤訊息（顯示用）
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

/// 投資組合驗證器
#[derive(Debug, Clone, Copy)]
pub struct PortfolioValidator {
    tolerance: f64,
    item_validator: HoldingValidator,
}

impl Default for PortfolioValidator {
    fn default() -> Self {
        Self::new(SESSION_TOLERANCE)
    }
}

impl PortfolioValidator {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            item_validator: HoldingValidator,
        }
    }

    /// 解析結果用的寬鬆驗證器
    pub fn for_parsed() -> Self {
        Self::new(PARSED_TOLERANCE)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// 驗證整個持倉清單
    pub fn validate(&self, holdings: &[Holding]) -> HoldingsReport {
        let total = total_allocation(holdings);
        let mut errors = Vec::new();

        if holdings.is_empty() {
            errors.push(HoldingsValidationError::Empty);
        }
        if (total - 100.0).abs() > self.tolerance {
            errors.push(HoldingsValidationError::AllocationSum { total });
        }
        errors.extend(self.item_validator.validate_batch(holdings));

        let mut seen = HashSet::new();
        for holding in holdings {
            let key = holding.ticker.trim().to_uppercase();
            if !key.is_empty() && !seen.insert(key) {
                errors.push(HoldingsValidationError::DuplicateTicker {
                    ticker: holding.ticker.clone(),
                });
            }
        }

        HoldingsReport {
            is_valid: errors.is_empty(),
            errors,
            total,
        }
    }
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data_ingestion::{HoldingsReport, ParseResult, PortfolioValidator};
use crate::domain_types::{Holding, PortfolioTemplate};
use crate::risk::{risk_profile, RiskProfile, RiskProvider};

/// 持倉的輸入方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Manual,
    Template,
    Csv,
    Pdf,
}

/// 使用者投資組合狀態
///
/// 每次修改持倉後都會重新驗證，`report` 永遠反映目前的持倉。
#[derive(Debug, Clone)]
pub struct PortfolioState {
    holdings: Vec<Holding>,
    input_mode: InputMode,
    report: HoldingsReport,
    validator: PortfolioValidator,
    risk_provider: RiskProvider,
    provider_score: Option<f64>,
}

impl Default for PortfolioState {
    fn default() -> Self {
        Self::new(PortfolioValidator::default())
    }
}

impl PortfolioState {
    pub fn new(validator: PortfolioValidator) -> Self {
        Self {
            holdings: Vec::new(),
            input_mode: InputMode::Manual,
            report: HoldingsReport {
                errors: Vec::new(),
                total: 0.0,
                is_valid: false,
            },
            validator,
            risk_provider: RiskProvider::NoProvider,
            provider_score: None,
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn report(&self) -> &HoldingsReport {
        &self.report
    }

    pub fn is_valid(&self) -> bool {
        self.report.is_valid
    }

    pub fn validation_errors(&self) -> Vec<String> {
        self.report.messages()
    }

    pub fn total_allocation(&self) -> f64 {
        self.report.total
    }

    fn revalidate(&mut self) {
        self.report = self.validator.validate(&self.holdings);
        debug!(
            "持倉驗證: {} 筆，合計 {:.1}%，錯誤 {} 個",
            self.holdings.len(),
            self.report.total,
            self.report.errors.len()
        );
    }

    pub fn set_holdings(&mut self, holdings: Vec<Holding>) {
        self.holdings = holdings;
        self.revalidate();
    }

    pub fn add_holding(&mut self, holding: Holding) {
        self.holdings.push(holding);
        self.revalidate();
    }

    /// 移除指定位置的持倉，索引超出範圍時不做任何事
    pub fn remove_holding(&mut self, index: usize) -> Option<Holding> {
        if index >= self.holdings.len() {
            return None;
        }
        let removed = self.holdings.remove(index);
        self.revalidate();
        Some(removed)
    }

    /// 以閉包修改指定位置的持倉，回傳是否有修改
    pub fn update_holding<F>(&mut self, index: usize, update: F) -> bool
    where
        F: FnOnce(&mut Holding),
    {
        let Some(holding) = self.holdings.get_mut(index) else {
            return false;
        };
        update(holding);
        holding.ticker = holding.ticker.trim().to_uppercase();
        self.revalidate();
        true
    }

    /// 帶入範本持倉
    pub fn set_from_template(&mut self, template: &PortfolioTemplate) {
        self.input_mode = InputMode::Template;
        self.set_holdings(template.holdings.clone());
    }

    /// 帶入解析結果；解析失敗時保留原持倉並回傳錯誤訊息
    pub fn set_from_parse(&mut self, result: ParseResult, mode: InputMode) -> Result<(), String> {
        if let Some(message) = result.error {
            return Err(message);
        }
        self.input_mode = mode;
        self.set_holdings(result.holdings);
        Ok(())
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    pub fn validate(&mut self) -> bool {
        self.revalidate();
        self.report.is_valid
    }

    /// 記錄外部問卷分數
    pub fn set_provider_score(&mut self, provider: RiskProvider, score: Option<f64>) {
        self.risk_provider = provider;
        self.provider_score = score.filter(|s| s.is_finite());
    }

    pub fn risk_provider(&self) -> RiskProvider {
        self.risk_provider
    }

    /// 外部分數換算後的內部分數
    pub fn internal_risk_score(&self) -> Option<i32> {
        self.provider_score.map(|score| self.risk_provider.normalize(score))
    }

    pub fn risk_profile(&self) -> Option<RiskProfile> {
        self.internal_risk_score().map(risk_profile)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.validator);
    }
}

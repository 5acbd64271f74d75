use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 應用程序配置結構
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub log: LogConfig,
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub fetch: FetchConfig,
    pub lead: LeadConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.log.validate()?;
        self.engine.validate()?;
        self.data.validate()?;
        self.fetch.validate()?;
        self.lead.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase().as_str(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase().as_str(),
            &["pretty", "json"],
            "log.format",
        )?;

        Ok(())
    }
}

/// 風險引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 年化無風險利率（小數）
    pub risk_free_rate: f64,
    /// 每年期數（月資料為 12）
    pub periods_per_year: u32,
    /// 部分持倉缺資料時是否以已覆蓋權重放大報酬
    #[serde(default)]
    pub rescale_partial_coverage: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            periods_per_year: 12,
            rescale_partial_coverage: false,
        }
    }
}

impl Validator for EngineConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(self.risk_free_rate, 0.0, 0.25, "engine.risk_free_rate")?;
        ValidationUtils::in_range(self.periods_per_year, 1, 366, "engine.periods_per_year")?;

        Ok(())
    }
}

/// 資料檔案配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub returns_path: String,
    pub tickers_path: String,
    /// 覆寫內建政策資料表的 TOML 檔
    #[serde(default)]
    pub policy_path: Option<String>,
}

impl Validator for DataConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.returns_path, "data.returns_path")?;
        ValidationUtils::not_empty(&self.tickers_path, "data.tickers_path")?;
        if let Some(path) = &self.policy_path {
            ValidationUtils::not_empty(path, "data.policy_path")?;
        }

        Ok(())
    }
}

/// 報酬序列按需取得配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_tickers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            timeout_secs: 10,
            max_tickers: 50,
        }
    }
}

impl FetchConfig {
    /// 獲取請求超時持續時間
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Validator for FetchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::check_dependency(
            self.enabled,
            !self.endpoint.trim().is_empty(),
            "fetch.enabled",
            "fetch.endpoint",
        )?;
        if self.enabled {
            ValidationUtils::http_url(&self.endpoint, "fetch.endpoint")?;
        }
        ValidationUtils::in_range(self.timeout_secs, 1, 120, "fetch.timeout_secs")?;
        ValidationUtils::in_range(self.max_tickers, 1, 50, "fetch.max_tickers")?;

        Ok(())
    }
}

/// 潛在客戶資料送出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            timeout_secs: 5,
        }
    }
}

impl LeadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Validator for LeadConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::check_dependency(
            self.enabled,
            !self.endpoint.trim().is_empty(),
            "lead.enabled",
            "lead.endpoint",
        )?;
        if self.enabled {
            ValidationUtils::http_url(&self.endpoint, "lead.endpoint")?;
        }
        ValidationUtils::in_range(self.timeout_secs, 1, 60, "lead.timeout_secs")?;

        Ok(())
    }
}

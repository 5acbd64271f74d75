//! 潛在客戶資料送出
//!
//! 送出為射後不理：在背景任務中執行，失敗只記錄，不影響分析流程。

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{FetchError, FetchResult};
use crate::config::LeadConfig;
use crate::domain_types::Holding;

/// 送出時所在的流程階段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStep {
    PreAnalysis,
    #[default]
    PostOptimization,
}

impl fmt::Display for LeadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreAnalysis => write!(f, "pre-analysis"),
            Self::PostOptimization => write!(f, "post-optimization"),
        }
    }
}

/// 聯絡資訊與投資組合快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub holdings_count: usize,
    pub tickers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thor_allocation: Option<u8>,
    pub step: LeadStep,
    pub timestamp: DateTime<Utc>,
}

impl LeadSubmission {
    pub fn new(name: impl Into<String>, email: impl Into<String>, holdings: &[Holding], step: LeadStep) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            company: String::new(),
            holdings_count: holdings.len(),
            tickers: holdings
                .iter()
                .map(|h| h.ticker.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            risk_score: None,
            current_risk_score: None,
            optimized_risk_score: None,
            thor_allocation: None,
            step,
            timestamp: Utc::now(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// 使用者自填或由供應商換算的風險分數
    pub fn with_risk_score(mut self, score: i32) -> Self {
        self.risk_score = Some(score);
        self
    }

    /// 最佳化前後的風險分數與 THOR 配置
    pub fn with_optimization(mut self, current: u8, optimized: u8, thor_allocation: u8) -> Self {
        self.current_risk_score = Some(current);
        self.optimized_risk_score = Some(optimized);
        self.thor_allocation = Some(thor_allocation);
        self
    }

    /// 姓名不可為空，電子郵件必須含 `@`
    pub fn can_submit(&self) -> bool {
        !self.name.is_empty() && self.email.contains('@')
    }

    pub fn validate(&self) -> FetchResult<()> {
        if self.name.is_empty() {
            return Err(FetchError::InvalidPayload("name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(FetchError::InvalidPayload(format!("invalid email: {}", self.email)));
        }
        Ok(())
    }
}

/// 潛在客戶資料送出客戶端
#[derive(Debug, Clone)]
pub struct LeadClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl LeadClient {
    pub fn new(config: &LeadConfig) -> FetchResult<Self> {
        if !config.enabled {
            return Err(FetchError::Disabled("lead"));
        }
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
        })
    }

    /// 送出並等待結果
    pub async fn submit(&self, lead: &LeadSubmission) -> FetchResult<()> {
        lead.validate()?;

        let request = self.client.post(&self.endpoint).json(lead).send();
        let response = match timeout(self.timeout, request).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::TimeoutError(self.timeout.as_secs())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::StatusError(status.as_u16()));
        }
        info!("潛在客戶資料已送出: {} ({})", lead.id, lead.step);
        Ok(())
    }

    /// 在背景送出，錯誤只記錄
    pub fn submit_detached(&self, lead: LeadSubmission) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(err) = client.submit(&lead).await {
                warn!("潛在客戶資料送出失敗: {}", err);
            }
        })
    }
}

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{DataError, DataResult};
use crate::config::{DataConfig, TickerPolicy};
use crate::domain_types::{ReturnsData, TickerCatalog};

/// 分析所需的靜態資料集
#[derive(Debug, Clone)]
pub struct Dataset {
    pub returns: ReturnsData,
    pub catalog: TickerCatalog,
    pub policy: Arc<TickerPolicy>,
}

/// 資料集載入器特性 - 定義資料來源的核心接口
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// 加載歷史月報酬矩陣
    async fn load_returns(&self) -> DataResult<ReturnsData>;

    /// 加載範本與代號查詢表
    async fn load_catalog(&self) -> DataResult<TickerCatalog>;

    /// 加載代號政策，未指定外部檔案時使用內建政策
    async fn load_policy(&self) -> DataResult<Arc<TickerPolicy>>;

    /// 一次加載全部資料
    async fn load_dataset(&self) -> DataResult<Dataset> {
        let (returns, catalog, policy) =
            tokio::try_join!(self.load_returns(), self.load_catalog(), self.load_policy())?;
        info!(
            "資料集加載完成: {} 個代號、{} 期、{} 個範本",
            returns.returns.len(),
            returns.len(),
            catalog.templates.len()
        );
        Ok(Dataset {
            returns,
            catalog,
            policy,
        })
    }
}

/// 從本地 JSON 檔案加載資料集
#[derive(Debug, Clone)]
pub struct FileDatasetLoader {
    returns_path: PathBuf,
    tickers_path: PathBuf,
    policy_path: Option<PathBuf>,
}

impl FileDatasetLoader {
    pub fn new(returns_path: impl Into<PathBuf>, tickers_path: impl Into<PathBuf>) -> Self {
        Self {
            returns_path: returns_path.into(),
            tickers_path: tickers_path.into(),
            policy_path: None,
        }
    }

    /// 指定覆寫內建政策的 TOML 檔
    pub fn with_policy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = Some(path.into());
        self
    }

    /// 由配置建立
    pub fn from_config(config: &DataConfig) -> Self {
        let loader = Self::new(&config.returns_path, &config.tickers_path);
        match &config.policy_path {
            Some(path) => loader.with_policy_path(path),
            None => loader,
        }
    }
}

async fn read_text(path: &Path) -> DataResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DataError::IoError {
            path: path.display().to_string(),
            source,
        })
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    let content = read_text(path).await?;
    debug!("讀取 {} ({} 位元組)", path.display(), content.len());
    serde_json::from_str(&content).map_err(|source| DataError::ParseError {
        path: path.display().to_string(),
        source,
    })
}

#[async_trait]
impl DatasetLoader for FileDatasetLoader {
    async fn load_returns(&self) -> DataResult<ReturnsData> {
        read_json(&self.returns_path).await
    }

    async fn load_catalog(&self) -> DataResult<TickerCatalog> {
        read_json(&self.tickers_path).await
    }

    async fn load_policy(&self) -> DataResult<Arc<TickerPolicy>> {
        let Some(path) = &self.policy_path else {
            return Ok(TickerPolicy::builtin());
        };
        let content = read_text(path).await?;
        let policy = TickerPolicy::from_toml_str(&content)?;
        info!("使用外部政策檔: {}", path.display());
        Ok(Arc::new(policy))
    }
}

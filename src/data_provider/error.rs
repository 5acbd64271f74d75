use thiserror::Error;

use crate::config::PolicyError;

/// 資料集載入錯誤
#[derive(Error, Debug)]
pub enum DataError {
    #[error("資料檔讀取錯誤 ({path}): {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("資料檔解析錯誤 ({path}): {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("政策檔錯誤: {0}")]
    PolicyError(#[from] PolicyError),
}

pub type DataResult<T> = Result<T, DataError>;

/// 遠端請求錯誤
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP 請求錯誤: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("請求超時 ({0}秒)")]
    TimeoutError(u64),

    #[error("回應狀態異常: {0}")]
    StatusError(u16),

    #[error("無效的請求內容: {0}")]
    InvalidPayload(String),

    #[error("功能未啟用: {0}")]
    Disabled(&'static str),
}

pub type FetchResult<T> = Result<T, FetchError>;

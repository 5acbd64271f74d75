// 模組定義
pub mod config;
pub mod domain_types;
pub mod data_ingestion;
pub mod data_provider;
pub mod optimization;
pub mod risk;
pub mod session;

//! 分析工作階段狀態
//!
//! 投資組合、分析結果與最佳化滑桿各自是一個狀態容器，由呼叫端持有並以
//! 參考傳遞；所有計算都是純函數，狀態只保存最近一次的結果。

pub mod analysis;
pub mod optimization;
pub mod portfolio;

pub use analysis::AnalysisState;
pub use optimization::{OptimizationState, DEFAULT_TARGET_SCORE, MAX_SINGLE_PCT};
pub use portfolio::{InputMode, PortfolioState};

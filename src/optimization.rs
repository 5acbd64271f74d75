//! 混合最佳化模組
//!
//! 以 THIR / THLV 兩檔防禦型產品與原始持倉混合，建立 101 點網格並依模式搜尋。

pub mod grid;
pub mod search;

pub use grid::{
    apply_thor_allocation, apply_thor_split, compute_metrics_for_allocation, compute_metrics_for_allocation_with,
    compute_metrics_for_split, compute_optimization_grid, compute_optimization_grid_with, OptimizationResult,
    THIR_NAME, THIR_TICKER, THLV_NAME, THLV_TICKER,
};
pub use search::{find_optimal, find_optimal_point, OptimizationMode};

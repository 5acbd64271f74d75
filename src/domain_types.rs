pub mod holding;
pub mod returns_data;
pub mod metrics;
pub mod ticker_info;
pub mod risk_category;

pub use holding::{round_allocation, total_allocation, Holding, HoldingType};
pub use returns_data::ReturnsData;
pub use metrics::PortfolioMetrics;
pub use ticker_info::{PortfolioTemplate, TickerCatalog, TickerInfo};
pub use risk_category::{risk_category_color, risk_category_label, RiskCategory, RISK_CATEGORIES};

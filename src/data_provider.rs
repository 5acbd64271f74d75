pub mod error;
pub mod fetcher;
pub mod lead;
pub mod loader;

pub use error::{DataError, DataResult, FetchError, FetchResult};
pub use fetcher::{align_monthly_returns, fetch_missing, HttpReturnsFetcher, MonthlyBar, ReturnsFetcher};
pub use lead::{LeadClient, LeadStep, LeadSubmission};
pub use loader::{Dataset, DatasetLoader, FileDatasetLoader};

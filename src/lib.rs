pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod report;
pub mod scanner;

pub use config::Config;
pub use error::{Error, Result};
pub use fetcher::{HttpReportFetcher, ReportSource};
pub use model::{Edition, ReleaseTag, ReportFormat};
pub use report::ReportBuilder;
pub use scanner::{ScanOrchestrator, ScanSettings};

pub mod aggregator;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod reader;
pub mod record;
pub mod stats;

pub use aggregator::{BatchSummary, KpiAggregator, run_batch};
pub use config::KpiConfig;
pub use error::KpiError;
pub use reader::{MalformedLine, RecordCandidate, RecordReader};
pub use record::{GroupKey, RawRecord, StatusClass, SummaryRow};

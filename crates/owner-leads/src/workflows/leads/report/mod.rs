mod summary;
pub mod views;

pub use summary::{ChannelReport, ChannelTally};
pub use views::{ChannelPerformanceEntry, ChannelReportSummary, MonthlyLeadPoint};

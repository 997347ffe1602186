pub mod classification_report;
pub mod plots;

pub use classification_report::{classification_report, ClassificationReport, ReportRow};

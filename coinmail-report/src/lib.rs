//! coinmail-report: batch pipeline, report aggregation and CSV output.

pub mod aggregate;
pub mod csv_writer;
pub mod pipeline;

pub use aggregate::{CategoryRecords, Reports, aggregate, write_reports};
pub use csv_writer::{ReportRow, write_csv};
pub use pipeline::{
    BatchReport, CategoryFiles, RunConfig, convert_messages, extract_files, extract_records, run,
    run_convert, run_report,
};

//! Batch pipeline: messages -> bucketed text files -> records -> reports.
//!
//! Every per-file step returns a `Result`; failures are logged, collected into
//! the [`BatchReport`], and the batch moves on. Only a bad [`RunConfig`] stops
//! a run before any file is touched.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use coinmail_core::{
    Category, Error, ExtractionRows, FundingKind, FundingRecord, TradeRecord, classify_message,
    extract_funding, extract_trade,
};
use coinmail_ingest::{
    ConversionUnit, DecodeError, MessageReader, OutputLayout, discover_messages,
    ensure_output_layout, read_text_file, text_file_name, write_text_file,
};
use log::{debug, info, warn};

use crate::aggregate::{CategoryRecords, aggregate, write_reports};

pub const DEFAULT_EXTENSION: &str = "eml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Message file extension to pick up from `source_dir`, without the dot.
    pub extension: String,
    pub rows: ExtractionRows,
}

impl RunConfig {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            rows: ExtractionRows::default(),
        }
    }

    /// Check both directories before anything is read or written.
    pub fn validate(&self) -> Result<(), Error> {
        validate_source_dir(&self.source_dir)?;
        validate_output_dir(&self.output_dir)?;
        if self.extension.trim().trim_start_matches('.').is_empty() {
            return Err(Error::Configuration("message extension is empty".into()));
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        self.extension.trim().trim_start_matches('.')
    }
}

fn validate_source_dir(dir: &Path) -> Result<(), Error> {
    if dir.as_os_str().is_empty() {
        return Err(Error::Configuration("source directory is empty".into()));
    }
    if !dir.exists() {
        return Err(Error::Configuration(format!(
            "source directory {} could not be found; pass the folder holding the exported messages",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(Error::Configuration(format!(
            "{} is a single file; pass the folder holding the exported messages",
            dir.display()
        )));
    }
    Ok(())
}

fn validate_output_dir(dir: &Path) -> Result<(), Error> {
    if dir.as_os_str().is_empty() {
        return Err(Error::Configuration("output directory is empty".into()));
    }
    if dir.exists() && !dir.is_dir() {
        return Err(Error::Configuration(format!(
            "{} is an existing file; pass a folder for the converted output (it is created if missing)",
            dir.display()
        )));
    }
    Ok(())
}

/// Outcome of the conversion phase.
#[derive(Debug, Default)]
pub struct ConvertSummary {
    /// Written text files with their category, in discovery order.
    pub converted: Vec<(PathBuf, Category)>,
    pub failures: Vec<Error>,
}

impl ConvertSummary {
    pub fn unclassified(&self) -> usize {
        self.converted
            .iter()
            .filter(|(_, c)| *c == Category::Unclassified)
            .count()
    }
}

/// Outcome of the extraction phase.
#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub records: CategoryRecords,
    pub scanned: usize,
    pub failures: Vec<Error>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub discovered: usize,
    pub converted: usize,
    pub unclassified: usize,
    pub scanned: usize,
    pub trades: usize,
    pub funding: usize,
    pub failures: Vec<Error>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed_files(&self) -> Vec<&Path> {
        self.failures.iter().filter_map(Error::file).collect()
    }
}

fn decode_failure(path: &Path, err: DecodeError) -> Error {
    match err {
        DecodeError::Io(source) => Error::io(path, source),
        other => Error::Decode {
            file: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// Decode one message and file it under its category bucket.
///
/// `claimed` maps every bucket file written so far in this batch to the
/// message it came from; a second message landing on the same file is
/// refused instead of overwriting the first.
fn convert_one<R: MessageReader + ?Sized>(
    reader: &R,
    path: &Path,
    layout: &OutputLayout,
    claimed: &mut HashMap<PathBuf, PathBuf>,
) -> Result<(PathBuf, Category), Error> {
    let message = reader.read(path).map_err(|e| decode_failure(path, e))?;

    let file_name = text_file_name(path).ok_or_else(|| Error::Decode {
        file: path.to_path_buf(),
        reason: "file name is not valid UTF-8".into(),
    })?;
    let label = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let category = classify_message(label, &message.subject);
    if category == Category::Unclassified {
        info!(
            "{}: subject {:?} matches no known notification, filing for manual review",
            path.display(),
            message.subject
        );
    }

    let target = layout.bucket(category).join(&file_name);
    if let Some(first) = claimed.get(&target) {
        return Err(Error::io(
            path,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "converts to {}, already written from {}",
                    target.display(),
                    first.display()
                ),
            ),
        ));
    }

    let unit = ConversionUnit::new(message.sent_at, layout.root(), message.body, file_name)
        .map_err(|source| Error::Validation {
            file: path.to_path_buf(),
            category,
            source,
        })?;
    let written = write_text_file(layout, category, &unit).map_err(|e| Error::io(path, e))?;
    claimed.insert(written.clone(), path.to_path_buf());
    debug!("{} -> {}", path.display(), written.display());
    Ok((written, category))
}

/// Convert every source message into a dated text file in its bucket.
pub fn convert_messages<R: MessageReader + ?Sized>(
    reader: &R,
    sources: &[PathBuf],
    layout: &OutputLayout,
) -> ConvertSummary {
    let mut summary = ConvertSummary::default();
    let mut claimed = HashMap::new();
    for path in sources {
        match convert_one(reader, path, layout, &mut claimed) {
            Ok(done) => summary.converted.push(done),
            Err(err) => {
                warn!("{err}");
                summary.failures.push(err);
            }
        }
    }
    summary
}

fn read_converted(path: &Path) -> Result<(String, DateTime<Utc>), Error> {
    read_text_file(path).map_err(|e| Error::io(path, e))
}

fn trade_from_file(path: &Path, category: Category, row: usize) -> Result<TradeRecord, Error> {
    let (body, at) = read_converted(path)?;
    let extracted = extract_trade(&body, row).map_err(|source| Error::Extraction {
        file: path.to_path_buf(),
        category,
        source,
    })?;
    TradeRecord::build(extracted.fields, at, extracted.line).map_err(|source| Error::Validation {
        file: path.to_path_buf(),
        category,
        source,
    })
}

fn funding_from_file(path: &Path, kind: FundingKind, row: usize) -> Result<FundingRecord, Error> {
    let category = kind.category();
    let (body, at) = read_converted(path)?;
    let extracted = extract_funding(&body, row, kind).map_err(|source| Error::Extraction {
        file: path.to_path_buf(),
        category,
        source,
    })?;
    FundingRecord::build(extracted.fields, kind, at, extracted.line).map_err(|source| {
        Error::Validation {
            file: path.to_path_buf(),
            category,
            source,
        }
    })
}

/// Converted text files per report category, each list in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFiles {
    pub filled: Vec<PathBuf>,
    pub partial: Vec<PathBuf>,
    pub withdrawals: Vec<PathBuf>,
    pub deposits: Vec<PathBuf>,
}

impl CategoryFiles {
    /// Group the files written by [`convert_messages`], keeping discovery order.
    pub fn from_converted(converted: &[(PathBuf, Category)]) -> Self {
        let mut files = Self::default();
        for (path, category) in converted {
            files.push(*category, path.clone());
        }
        files
    }

    fn push(&mut self, category: Category, path: PathBuf) {
        match category {
            Category::TradeFilled => self.filled.push(path),
            Category::TradePartial => self.partial.push(path),
            Category::Withdrawal => self.withdrawals.push(path),
            Category::Deposit => self.deposits.push(path),
            Category::Unclassified => {}
        }
    }
}

/// Run `build` over `files`, keeping successes in order.
fn collect_files<T>(
    files: &[PathBuf],
    summary: &mut ExtractSummary,
    build: impl Fn(&Path) -> Result<T, Error>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(files.len());
    for path in files {
        summary.scanned += 1;
        match build(path) {
            Ok(record) => out.push(record),
            Err(err) => {
                warn!("{err}");
                summary.failures.push(err);
            }
        }
    }
    out
}

/// Extract records from already-grouped text files.
pub fn extract_files(files: &CategoryFiles, rows: ExtractionRows) -> ExtractSummary {
    let mut summary = ExtractSummary::default();

    let filled = collect_files(&files.filled, &mut summary, |p| {
        trade_from_file(p, Category::TradeFilled, rows.trade)
    });
    let partial = collect_files(&files.partial, &mut summary, |p| {
        trade_from_file(p, Category::TradePartial, rows.trade)
    });
    let withdrawals = collect_files(&files.withdrawals, &mut summary, |p| {
        funding_from_file(p, FundingKind::Withdrawal, rows.funding)
    });
    let deposits = collect_files(&files.deposits, &mut summary, |p| {
        funding_from_file(p, FundingKind::Deposit, rows.funding)
    });

    summary.records = CategoryRecords {
        filled,
        partial,
        withdrawals,
        deposits,
    };
    summary
}

/// Extract records from whatever is filed in the filled, partial, withdrawal
/// and deposit buckets, each bucket sorted by file name.
pub fn extract_records(layout: &OutputLayout, rows: ExtractionRows) -> ExtractSummary {
    let mut files = CategoryFiles::default();
    let mut failures = Vec::new();

    for category in [
        Category::TradeFilled,
        Category::TradePartial,
        Category::Withdrawal,
        Category::Deposit,
    ] {
        match layout.bucket_files(category) {
            Ok(paths) => {
                for path in paths {
                    files.push(category, path);
                }
            }
            Err(e) => {
                let err = Error::io(layout.bucket(category), e);
                warn!("{err}");
                failures.push(err);
            }
        }
    }

    let mut summary = extract_files(&files, rows);
    failures.append(&mut summary.failures);
    summary.failures = failures;
    summary
}

fn prepare_layout(dir: &Path) -> Result<OutputLayout> {
    validate_output_dir(dir)?;
    ensure_output_layout(dir).with_context(|| format!("creating output layout in {}", dir.display()))
}

/// Validate, lay out the output folder, discover and convert.
fn convert_batch<R: MessageReader + ?Sized>(
    config: &RunConfig,
    reader: &R,
) -> Result<(OutputLayout, usize, ConvertSummary)> {
    config.validate()?;
    let layout = prepare_layout(&config.output_dir)?;

    let sources = discover_messages(&config.source_dir, config.extension())
        .with_context(|| format!("listing {}", config.source_dir.display()))?;
    info!(
        "found {} .{} messages in {}",
        sources.len(),
        config.extension(),
        config.source_dir.display()
    );

    let converted = convert_messages(reader, &sources, &layout);
    Ok((layout, sources.len(), converted))
}

fn write_batch_reports(layout: &OutputLayout, extracted: ExtractSummary) -> Result<BatchReport> {
    let scanned = extracted.scanned;
    let reports = aggregate(extracted.records);
    write_reports(&reports, layout)?;

    Ok(BatchReport {
        scanned,
        trades: reports.trades.len(),
        funding: reports.funding.len(),
        failures: extracted.failures,
        ..BatchReport::default()
    })
}

/// Conversion only: decode and file every message, no reports.
pub fn run_convert<R: MessageReader + ?Sized>(config: &RunConfig, reader: &R) -> Result<BatchReport> {
    let (_, discovered, converted) = convert_batch(config, reader)?;
    Ok(BatchReport {
        discovered,
        converted: converted.converted.len(),
        unclassified: converted.unclassified(),
        failures: converted.failures,
        ..BatchReport::default()
    })
}

/// Reports only: re-extract from text files already filed under `output_dir`.
pub fn run_report(output_dir: &Path, rows: ExtractionRows) -> Result<BatchReport> {
    let layout = prepare_layout(output_dir)?;
    write_batch_reports(&layout, extract_records(&layout, rows))
}

/// Full run: convert every message, then build both reports from the files
/// this run wrote, in source discovery order.
pub fn run<R: MessageReader + ?Sized>(config: &RunConfig, reader: &R) -> Result<BatchReport> {
    let (layout, discovered, converted) = convert_batch(config, reader)?;
    let files = CategoryFiles::from_converted(&converted.converted);
    let reported = write_batch_reports(&layout, extract_files(&files, config.rows))?;

    let converted_count = converted.converted.len();
    let unclassified = converted.unclassified();
    let mut failures = converted.failures;
    failures.extend(reported.failures);

    Ok(BatchReport {
        discovered,
        converted: converted_count,
        unclassified,
        failures,
        ..reported
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coinmail_ingest::DecodedMessage;
    use std::fs;

    /// In-memory reader keyed by file name.
    struct FakeReader(HashMap<String, DecodedMessage>);

    impl MessageReader for FakeReader {
        fn read(&self, path: &Path) -> Result<DecodedMessage, DecodeError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.0.get(&name).cloned().ok_or(DecodeError::MissingDate)
        }
    }

    fn message(subject: &str, data_row: usize, line: &str) -> DecodedMessage {
        let mut body: Vec<String> = (0..data_row).map(|i| format!("header {i}")).collect();
        body.push(line.to_string());
        body.push("footer".to_string());
        DecodedMessage {
            body: body.join("\r\n"),
            sent_at: Utc.with_ymd_and_hms(2018, 1, 14, 17, 3, 9).unwrap(),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_missing_and_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = RunConfig::new(dir.path().join("nope"), dir.path().join("out"));
        assert!(matches!(missing.validate(), Err(Error::Configuration(_))));

        let file = dir.path().join("a.eml");
        fs::write(&file, "x").unwrap();
        let as_file = RunConfig::new(&file, dir.path().join("out"));
        assert!(as_file.validate().unwrap_err().is_fatal());

        let out_is_file = RunConfig::new(dir.path(), &file);
        assert!(matches!(out_is_file.validate(), Err(Error::Configuration(_))));

        assert!(RunConfig::new(dir.path(), dir.path().join("out")).validate().is_ok());
        // validation alone creates nothing
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_convert_routes_by_file_name_then_subject() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ensure_output_layout(dir.path().join("out")).unwrap();
        let reader = FakeReader(HashMap::from([
            ("Order Filled.eml".to_string(), message("", 5, "x")),
            ("msg-2.eml".to_string(), message("Funds Added", 4, "y")),
            ("msg-3.eml".to_string(), message("Newsletter", 4, "z")),
        ]));
        let sources: Vec<PathBuf> = ["Order Filled.eml", "msg-2.eml", "msg-3.eml", "broken.eml"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let summary = convert_messages(&reader, &sources, &layout);
        let categories: Vec<_> = summary.converted.iter().map(|(_, c)| *c).collect();
        assert_eq!(
            categories,
            vec![Category::TradeFilled, Category::Deposit, Category::Unclassified]
        );
        assert_eq!(summary.unclassified(), 1);
        assert!(layout.bucket(Category::TradeFilled).join("Order Filled.txt").is_file());
        assert!(layout.bucket(Category::Deposit).join("msg-2.txt").is_file());
        assert!(layout.bucket(Category::Unclassified).join("msg-3.txt").is_file());

        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(&summary.failures[0], Error::Decode { file, .. } if file.ends_with("broken.eml")));
    }

    #[test]
    fn test_extract_isolates_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ensure_output_layout(dir.path()).unwrap();
        let reader = FakeReader(HashMap::from([
            (
                "Order Filled 1.eml".to_string(),
                message("", 5, "BTC/CAD Sell Order ID# 1 was filled for $50.00CAD"),
            ),
            (
                "Order Filled 2.eml".to_string(),
                message("", 5, "this line matches nothing"),
            ),
            (
                "Order Filled 3.eml".to_string(),
                message("", 5, "ΞTH/XɃT Sell Order ID# 3 was filled for 0.25ΞTH"),
            ),
        ]));
        let sources: Vec<PathBuf> = ["Order Filled 1.eml", "Order Filled 2.eml", "Order Filled 3.eml"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let converted = convert_messages(&reader, &sources, &layout);
        assert!(converted.failures.is_empty());

        let extracted = extract_records(&layout, ExtractionRows::default());
        assert_eq!(extracted.scanned, 3);
        assert_eq!(extracted.failures.len(), 1);
        assert!(matches!(
            &extracted.failures[0],
            Error::Extraction { file, category: Category::TradeFilled, .. } if file.ends_with("Order Filled 2.txt")
        ));

        let filled = &extracted.records.filled;
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[0].sell_order_id, "1");
        assert_eq!(filled[0].counter_currency, "BTC");
        assert_eq!(filled[0].date_utc, "2018-01-14T17:03:09Z");
        assert_eq!(filled[1].traded_currency, "eth");
        assert_eq!(filled[1].counter_currency, "btc");
        assert!(filled[1].comment.starts_with("ΞTH/XɃT"));
    }

    #[test]
    fn test_convert_refuses_second_message_for_same_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ensure_output_layout(dir.path()).unwrap();
        let reader = FakeReader(HashMap::from([
            ("Funds Added.eml".to_string(), message("", 4, "100.00CAD for a")),
            ("Funds Added.EML".to_string(), message("", 4, "250.00CAD for b")),
        ]));
        let sources: Vec<PathBuf> = ["Funds Added.eml", "Funds Added.EML"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let summary = convert_messages(&reader, &sources, &layout);
        assert_eq!(summary.converted.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        match &summary.failures[0] {
            Error::Io { path, source } => {
                assert!(path.ends_with("Funds Added.EML"));
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
                assert!(source.to_string().contains("Funds Added.eml"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }

        let (body, _) = read_text_file(&layout.bucket(Category::Deposit).join("Funds Added.txt")).unwrap();
        assert!(body.contains("100.00CAD"));
        assert!(!body.contains("250.00CAD"));
    }

    #[test]
    fn test_run_keeps_discovery_order_in_reports() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        // "Funds Added.eml" sorts before "Funds Added.p.eml", but their text
        // files sort the other way round
        for name in ["Funds Added.eml", "Funds Added.p.eml"] {
            fs::write(src.join(name), "stub").unwrap();
        }
        let reader = FakeReader(HashMap::from([
            ("Funds Added.eml".to_string(), message("", 4, "1.00CAD for a")),
            ("Funds Added.p.eml".to_string(), message("", 4, "2.00CAD for b")),
        ]));
        let config = RunConfig::new(&src, dir.path().join("out"));

        let report = run(&config, &reader).unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.funding, 2);

        let layout = OutputLayout::new(dir.path().join("out"));
        let csv = fs::read_to_string(layout.funding_report()).unwrap();
        let first = csv.find("\"1.00\"").unwrap();
        let second = csv.find("\"2.00\"").unwrap();
        assert!(first < second);
    }
}

//! Quoted UTF-8 CSV output for report rows.

use std::path::Path;

use anyhow::{Context, Result};
use coinmail_core::{FundingRecord, TradeRecord};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

/// A row type with a fixed column set.
///
/// The header is written even when there are no rows, so an empty batch still
/// yields a well-formed report.
pub trait ReportRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl ReportRow for TradeRecord {
    const HEADER: &'static [&'static str] = &[
        "pair1",
        "pair2",
        "sellOrderId",
        "amount",
        "tradedCurrency",
        "counterCurrency",
        "dateUtc",
        "comment",
    ];
}

impl ReportRow for FundingRecord {
    const HEADER: &'static [&'static str] = &["amount", "currency", "dateUtc", "comment", "type"];
}

/// Write `rows` to `path`, replacing any existing file. Every field is quoted.
pub fn write_csv<R: ReportRow>(path: &Path, rows: &[R]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    wtr.write_record(R::HEADER)
        .with_context(|| format!("writing header to {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coinmail_core::{FundingKind, extract::FundingFields};
    use std::fs;

    fn funding(amount: &str, comment: &str) -> FundingRecord {
        FundingRecord::build(
            FundingFields {
                amount: amount.into(),
                currency: "CAD".into(),
            },
            FundingKind::Deposit,
            Utc.with_ymd_and_hms(2018, 2, 1, 12, 0, 0).unwrap(),
            comment,
        )
        .unwrap()
    }

    #[test]
    fn test_every_field_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("funding.csv");
        write_csv(&path, &[funding("100.00", "100.00CAD for your account, thanks")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], r#""amount","currency","dateUtc","comment","type""#);
        assert_eq!(
            lines[1],
            r#""100.00","CAD","2018-02-01T12:00:00Z","100.00CAD for your account, thanks","Deposit""#
        );
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        write_csv::<TradeRecord>(&path, &[]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with(r#""pair1","pair2","sellOrderId""#));
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("funding.csv");
        fs::write(&path, "stale content that is much longer than the new report\n".repeat(20)).unwrap();
        write_csv(&path, &[funding("1", "c")]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_header_matches_serde_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.csv");
        let mut wtr = csv::Writer::from_path(&path).unwrap();
        wtr.serialize(funding("1", "c")).unwrap();
        wtr.flush().unwrap();
        drop(wtr);
        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, FundingRecord::HEADER.join(","));
    }
}

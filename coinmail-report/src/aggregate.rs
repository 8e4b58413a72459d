//! Merging per-category records into the two final reports.

use anyhow::Result;
use coinmail_core::{FundingRecord, TradeRecord};
use coinmail_ingest::OutputLayout;
use log::info;

use crate::csv_writer::write_csv;

/// Records per category, each in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRecords {
    pub filled: Vec<TradeRecord>,
    pub partial: Vec<TradeRecord>,
    pub withdrawals: Vec<FundingRecord>,
    pub deposits: Vec<FundingRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reports {
    pub trades: Vec<TradeRecord>,
    pub funding: Vec<FundingRecord>,
}

/// Filled before partial; withdrawals before deposits. Nothing is sorted,
/// filtered or deduplicated.
pub fn aggregate(records: CategoryRecords) -> Reports {
    let CategoryRecords {
        mut filled,
        partial,
        mut withdrawals,
        deposits,
    } = records;

    filled.extend(partial);
    withdrawals.extend(deposits);

    Reports {
        trades: filled,
        funding: withdrawals,
    }
}

/// Write `trades.csv` and `funding.csv` under `FinalReports/`.
pub fn write_reports(reports: &Reports, layout: &OutputLayout) -> Result<()> {
    let trades_path = layout.trades_report();
    write_csv(&trades_path, &reports.trades)?;
    info!("wrote {} trades to {}", reports.trades.len(), trades_path.display());

    let funding_path = layout.funding_report();
    write_csv(&funding_path, &reports.funding)?;
    let deposits = reports.funding.iter().filter(|r| r.is_deposit()).count();
    info!(
        "wrote {} funding rows ({} deposits, {} withdrawals) to {}",
        reports.funding.len(),
        deposits,
        reports.funding.len() - deposits,
        funding_path.display()
    );

    Ok(())
}

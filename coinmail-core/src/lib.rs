//! coinmail-core: notification text normalization, classification, field extraction
//! and record building for exchange account-activity emails.

pub mod classify;
pub mod error;
pub mod extract;
pub mod records;
pub mod symbols;
pub mod types;

pub use classify::{classify, classify_message};
pub use error::{Error, ExtractError, Result, ValidationError};
pub use extract::{
    Extracted, ExtractionRows, FundingFields, TradeFields, extract_funding, extract_trade,
};
pub use records::{FundingRecord, TradeRecord, format_date_utc, resolve_counter_currency};
pub use symbols::normalize_symbols;
pub use types::{Category, FundingKind};

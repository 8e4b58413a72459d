//! Category-specific field extraction from a fixed row of the message body.
//!
//! Notification bodies follow a template: the data sentence sits on a known
//! row (5 for trades, 4 for deposits/withdrawals in the exports we have seen).
//! The row is configurable because templates shifted slightly over time.
//!
//! Expected data rows, after [`normalize_symbols`]:
//!   btc/CAD Sell Order ID# 123456 was filled for $50.00CAD
//!   Your request to withdraw 0.5btc using the bitcoin network has been received
//!   100.00CAD for your account

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::error::ExtractError;
use crate::symbols::{contains_stylized_glyph, normalize_symbols};
use crate::types::{Category, FundingKind};

pub const TRADE_PATTERN: &str =
    r"^(?P<pair1>.*?)/(?P<pair2>.*?) Sell Order ID# (?P<order>\d*).* for (?P<amount>[$.\d].*?)(?P<currency>[A-Za-z].*)$";
pub const WITHDRAWAL_PATTERN: &str =
    r"^Your request to withdraw (?P<amount>[$\d.].*?)(?P<currency>[A-Za-z].*?) using";
pub const DEPOSIT_PATTERN: &str = r"^(?P<amount>\d.*?)(?P<currency>[A-Za-z].*?) for";

fn trade_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TRADE_PATTERN).expect("invalid trade regex"))
}

fn withdrawal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(WITHDRAWAL_PATTERN).expect("invalid withdrawal regex"))
}

fn deposit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DEPOSIT_PATTERN).expect("invalid deposit regex"))
}

/// Zero-indexed body rows holding the data sentence, per record family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRows {
    pub trade: usize,
    pub funding: usize,
}

impl Default for ExtractionRows {
    fn default() -> Self {
        Self {
            trade: 5,
            funding: 4,
        }
    }
}

impl ExtractionRows {
    pub fn row_for(&self, category: Category) -> Option<usize> {
        if category.is_trade() {
            Some(self.trade)
        } else if category.is_funding() {
            Some(self.funding)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeFields {
    pub pair1: String,
    pub pair2: String,
    pub sell_order_id: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingFields {
    pub amount: String,
    pub currency: String,
}

/// Fields pulled from one body row, plus that row exactly as it appeared in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub line: String,
    pub fields: T,
}

/// Split a message body into lines, treating `\r\n`, `\n` and lone `\r` as breaks.
pub fn body_lines(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(i) => {
                out.push(&rest[..i]);
                let skip = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + skip..];
            }
            None => {
                out.push(rest);
                break;
            }
        }
    }
    out
}

fn data_row(body: &str, row: usize) -> Result<&str, ExtractError> {
    let lines = body_lines(body);
    lines.get(row).copied().ok_or(ExtractError::MissingRow {
        row,
        line_count: lines.len(),
    })
}

/// Drop one leading non-digit character (`$`, sign, stray symbol) from an amount token.
pub fn strip_amount_residue(raw: &str) -> &str {
    match raw.chars().next() {
        Some(c) if !c.is_ascii_digit() => &raw[c.len_utf8()..],
        _ => raw,
    }
}

/// Match a single, already-normalized trade line.
pub fn match_trade_line(line: &str) -> Option<TradeFields> {
    let caps = trade_re().captures(line)?;
    Some(TradeFields {
        pair1: caps["pair1"].trim().to_string(),
        pair2: caps["pair2"].trim().to_string(),
        sell_order_id: caps["order"].to_string(),
        amount: strip_amount_residue(caps["amount"].trim()).to_string(),
        currency: caps["currency"].trim().to_string(),
    })
}

/// Match a single, already-normalized deposit or withdrawal line.
pub fn match_funding_line(line: &str, kind: FundingKind) -> Option<FundingFields> {
    let re = match kind {
        FundingKind::Deposit => deposit_re(),
        FundingKind::Withdrawal => withdrawal_re(),
    };
    let caps = re.captures(line)?;
    Some(FundingFields {
        amount: strip_amount_residue(caps["amount"].trim()).to_string(),
        currency: caps["currency"].trim().to_string(),
    })
}

fn normalized_row(line: &str, row: usize) -> String {
    if contains_stylized_glyph(line) {
        debug!("row {row}: replacing stylized currency glyphs in {line:?}");
    }
    normalize_symbols(line)
}

/// Extract trade fields from `row` of a message body.
pub fn extract_trade(body: &str, row: usize) -> Result<Extracted<TradeFields>, ExtractError> {
    let line = data_row(body, row)?;
    let normalized = normalized_row(line, row);
    let fields = match_trade_line(&normalized).ok_or_else(|| ExtractError::NoMatch {
        row,
        pattern: TRADE_PATTERN,
        line: line.to_string(),
    })?;
    Ok(Extracted {
        line: line.to_string(),
        fields,
    })
}

/// Extract deposit/withdrawal fields from `row` of a message body.
pub fn extract_funding(
    body: &str,
    row: usize,
    kind: FundingKind,
) -> Result<Extracted<FundingFields>, ExtractError> {
    let line = data_row(body, row)?;
    let normalized = normalized_row(line, row);
    let pattern = match kind {
        FundingKind::Deposit => DEPOSIT_PATTERN,
        FundingKind::Withdrawal => WITHDRAWAL_PATTERN,
    };
    let fields = match_funding_line(&normalized, kind).ok_or_else(|| ExtractError::NoMatch {
        row,
        pattern,
        line: line.to_string(),
    })?;
    Ok(Extracted {
        line: line.to_string(),
        fields,
    })
}

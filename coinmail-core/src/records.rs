//! Report record shapes and the builder rules that fill them in.

use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::extract::{FundingFields, TradeFields};
use crate::types::FundingKind;

/// One trade notification (filled or partially filled order).
///
/// The email only states one side of the pair; `counter_currency` is the other
/// side and its amount is left for the accountant to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub pair1: String,
    pub pair2: String,
    pub sell_order_id: String,
    /// Amount of `traded_currency` stated in the notification.
    pub amount: String,
    pub traded_currency: String,
    pub counter_currency: String,
    pub date_utc: String,
    /// Source line, verbatim.
    pub comment: String,
}

/// One deposit or withdrawal notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRecord {
    pub amount: String,
    pub currency: String,
    pub date_utc: String,
    pub comment: String,
    #[serde(rename = "type")]
    pub kind: FundingKind,
}

/// Timestamp text used in both reports: RFC 3339, whole seconds, `Z` suffix.
pub fn format_date_utc(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Pick the side of the pair that is not `traded`.
///
/// When neither side matches, `pair1` is returned and a warning is logged;
/// that case has no agreed accounting meaning yet.
pub fn resolve_counter_currency<'a>(pair1: &'a str, pair2: &'a str, traded: &str) -> &'a str {
    if pair1.eq_ignore_ascii_case(traded) {
        pair2
    } else if pair2.eq_ignore_ascii_case(traded) {
        pair1
    } else {
        warn!(
            "traded currency {traded:?} is neither side of pair {pair1}/{pair2}; defaulting counter currency to {pair1:?}"
        );
        pair1
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

impl TradeRecord {
    pub fn build(
        fields: TradeFields,
        date_utc: DateTime<Utc>,
        comment: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        require(&fields.amount, "amount")?;
        require(&fields.currency, "tradedCurrency")?;

        let counter =
            resolve_counter_currency(&fields.pair1, &fields.pair2, &fields.currency).to_string();

        Ok(Self {
            pair1: fields.pair1,
            pair2: fields.pair2,
            sell_order_id: fields.sell_order_id,
            amount: fields.amount,
            traded_currency: fields.currency,
            counter_currency: counter,
            date_utc: format_date_utc(date_utc),
            comment: comment.into(),
        })
    }
}

impl FundingRecord {
    pub fn build(
        fields: FundingFields,
        kind: FundingKind,
        date_utc: DateTime<Utc>,
        comment: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        require(&fields.amount, "amount")?;
        require(&fields.currency, "currency")?;

        Ok(Self {
            amount: fields.amount,
            currency: fields.currency,
            date_utc: format_date_utc(date_utc),
            comment: comment.into(),
            kind,
        })
    }

    pub fn is_deposit(&self) -> bool {
        self.kind == FundingKind::Deposit
    }
}

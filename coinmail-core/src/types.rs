use serde::{Deserialize, Serialize};

/// Which of the known notification templates a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Deposit,
    TradeFilled,
    TradePartial,
    Withdrawal,
    Unclassified,
}

impl Category {
    /// Every category that has its own output bucket, in bucket-creation order.
    pub const ALL_BUCKETS: [Category; 5] = [
        Category::Deposit,
        Category::Withdrawal,
        Category::TradeFilled,
        Category::TradePartial,
        Category::Unclassified,
    ];

    /// Literal subject/file-name prefix that identifies the category.
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Category::Deposit => Some("Funds Added"),
            Category::TradeFilled => Some("Order Filled"),
            Category::TradePartial => Some("Order Partially Filled"),
            Category::Withdrawal => Some("Withdrawal Request Received"),
            Category::Unclassified => None,
        }
    }

    /// Directory (relative to the output root) that converted messages are filed under.
    pub fn bucket_dir(&self) -> &'static str {
        match self {
            Category::Deposit => "FundsAdded",
            Category::TradeFilled => "FilledOrders",
            Category::TradePartial => "PartialOrders",
            Category::Withdrawal => "Withdrawal",
            Category::Unclassified => "Unclassified",
        }
    }

    pub fn is_trade(&self) -> bool {
        matches!(self, Category::TradeFilled | Category::TradePartial)
    }

    pub fn is_funding(&self) -> bool {
        matches!(self, Category::Deposit | Category::Withdrawal)
    }

    /// Funding direction for deposit/withdrawal categories.
    pub fn funding_kind(&self) -> Option<FundingKind> {
        match self {
            Category::Deposit => Some(FundingKind::Deposit),
            Category::Withdrawal => Some(FundingKind::Withdrawal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Deposit => "deposit",
            Category::TradeFilled => "filled order",
            Category::TradePartial => "partially filled order",
            Category::Withdrawal => "withdrawal",
            Category::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

/// Direction of a funding movement. Serialized as the `type` column of the funding report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundingKind {
    Deposit,
    Withdrawal,
}

impl FundingKind {
    pub fn category(&self) -> Category {
        match self {
            FundingKind::Deposit => Category::Deposit,
            FundingKind::Withdrawal => Category::Withdrawal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_dirs_are_distinct() {
        let mut dirs: Vec<_> = Category::ALL_BUCKETS.iter().map(|c| c.bucket_dir()).collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), Category::ALL_BUCKETS.len());
    }

    #[test]
    fn test_funding_kind_round_trips_category() {
        for kind in [FundingKind::Deposit, FundingKind::Withdrawal] {
            assert_eq!(kind.category().funding_kind(), Some(kind));
        }
        assert_eq!(Category::TradeFilled.funding_kind(), None);
        assert!(Category::TradePartial.is_trade());
        assert!(!Category::Unclassified.is_funding());
    }
}

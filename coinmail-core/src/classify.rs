//! Subject-prefix routing of notification messages.

use crate::types::Category;

/// Prefix table, checked in order; first match wins.
const PREFIX_ORDER: [Category; 4] = [
    Category::Deposit,
    Category::TradeFilled,
    Category::TradePartial,
    Category::Withdrawal,
];

/// Classify a message by its identifying label (file stem or subject line).
///
/// Unknown labels are `Unclassified`, never an error.
pub fn classify(label: &str) -> Category {
    PREFIX_ORDER
        .iter()
        .copied()
        .find(|c| c.prefix().is_some_and(|p| label.starts_with(p)))
        .unwrap_or(Category::Unclassified)
}

/// Classify by file label first, then by subject if the label is not recognised.
pub fn classify_message(file_label: &str, subject: &str) -> Category {
    match classify(file_label) {
        Category::Unclassified => classify(subject),
        c => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prefixes() {
        assert_eq!(classify("Funds Added - 2017-12-01"), Category::Deposit);
        assert_eq!(classify("Order Filled"), Category::TradeFilled);
        assert_eq!(classify("Order Partially Filled (3)"), Category::TradePartial);
        assert_eq!(
            classify("Withdrawal Request Received.msg"),
            Category::Withdrawal
        );
    }

    #[test]
    fn test_unknown_is_unclassified() {
        assert_eq!(classify(""), Category::Unclassified);
        assert_eq!(classify("Password Reset"), Category::Unclassified);
        // prefix match only, and case-sensitive
        assert_eq!(classify("Re: Order Filled"), Category::Unclassified);
        assert_eq!(classify("order filled"), Category::Unclassified);
        assert_eq!(classify(" Order Filled"), Category::Unclassified);
    }

    #[test]
    fn test_subject_fallback() {
        assert_eq!(
            classify_message("message-0001", "Order Filled"),
            Category::TradeFilled
        );
        assert_eq!(
            classify_message("Funds Added", "Order Filled"),
            Category::Deposit
        );
        assert_eq!(classify_message("a", "b"), Category::Unclassified);
    }
}

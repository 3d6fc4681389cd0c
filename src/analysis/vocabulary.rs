//! Fixed word lists used by the aggregator.

/// Domain terms counted as customer issues, in ranking tie-break order.
pub const ISSUE_TERMS: &[&str] = &[
    "delivery",
    "shipping",
    "damaged",
    "broken",
    "defective",
    "quality",
    "poor",
    "bad",
    "service",
    "staff",
    "rude",
    "slow",
    "wait",
    "delay",
    "late",
    "missing",
    "wrong",
    "order",
    "cancel",
    "refund",
    "return",
    "exchange",
    "website",
    "online",
    "error",
    "payment",
    "charge",
    "billing",
    "price",
    "expensive",
    "customer",
    "support",
    "product",
    "item",
    "size",
    "color",
    "description",
    "packaging",
    "assembly",
];

/// Words ignored by the free-word tally (on top of the length filter).
pub const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "they", "were", "have", "from", "would", "been", "will", "your",
    "their", "when", "where", "what", "very", "much", "more", "some", "just", "like", "also",
    "only", "even", "well", "good", "great", "nice",
];

/// Returns true if `word` is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabularies_have_no_duplicates() {
        let issues: HashSet<_> = ISSUE_TERMS.iter().collect();
        assert_eq!(issues.len(), ISSUE_TERMS.len());

        let stops: HashSet<_> = STOP_WORDS.iter().collect();
        assert_eq!(stops.len(), STOP_WORDS.len());
    }

    #[test]
    fn test_is_stop_word() {
        assert!(is_stop_word("would"));
        assert!(!is_stop_word("delivery"));
    }
}

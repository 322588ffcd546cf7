//! Query and document tokenization
//!
//! Text is lowercased and split on any non-alphanumeric rune, so
//! "Rent Payment (Jan)" and "rent-payment jan" index identically.
//! Match quality is a total order: an exact token match outranks a
//! prefix match, which outranks a plain substring match.

/// How well a query token matched an indexed token, weakest first so the
/// derived ordering can be used directly in ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    Substring,
    Prefix,
    Exact,
}

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Grade how a query token matches an indexed token, if at all.
/// Both inputs are expected to be already-tokenized (lowercase).
pub fn match_quality(query: &str, indexed: &str) -> Option<MatchQuality> {
    if query == indexed {
        Some(MatchQuality::Exact)
    } else if indexed.starts_with(query) {
        Some(MatchQuality::Prefix)
    } else if indexed.contains(query) {
        Some(MatchQuality::Substring)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_and_lowercases() {
        assert_eq!(tokenize("Rent Payment"), vec!["rent", "payment"]);
        assert_eq!(tokenize("Co-op (Groceries)"), vec!["co", "op", "groceries"]);
        assert_eq!(tokenize("1350.00"), vec!["1350", "00"]);
        assert!(tokenize("  --  ").is_empty());
    }

    #[test]
    fn test_match_quality_grades() {
        assert_eq!(match_quality("rent", "rent"), Some(MatchQuality::Exact));
        assert_eq!(match_quality("ren", "rent"), Some(MatchQuality::Prefix));
        assert_eq!(match_quality("ent", "rent"), Some(MatchQuality::Substring));
        assert_eq!(match_quality("rent", "ren"), None);
        assert_eq!(match_quality("xyz", "rent"), None);
    }

    #[test]
    fn test_quality_ordering() {
        assert!(MatchQuality::Exact > MatchQuality::Prefix);
        assert!(MatchQuality::Prefix > MatchQuality::Substring);
    }
}

//! Property-based round-trip / idempotence tests (spec.md §8).

use filtercore::parser::FilterParser;
use filtercore::resources::ResourceStore;
use proptest::prelude::*;

fn domain_fragment() -> impl Strategy<Value = String> {
    "[a-z]{3,8}\\.(com|net|org)"
}

fn pattern_fragment() -> impl Strategy<Value = String> {
    "[a-z]{3,10}"
}

proptest! {
    /// Re-parsing the rule_string a parsed Domain filter emits yields
    /// a filter with the same category and eval_string (modulo the
    /// one-time badfilter suffix strip, not exercised by this strategy).
    #[test]
    fn domain_rule_reparse_is_stable(domain in domain_fragment()) {
        let rule = format!("||{domain}^");
        let resources = ResourceStore::new();
        let parser = FilterParser::new(&resources);

        let first = parser.parse_rule(&rule);
        let second = parser.parse_rule(&first.rule_string);

        prop_assert_eq!(first.category, second.category);
        prop_assert_eq!(first.eval_string, second.eval_string);
    }

    /// A plain literal pattern always round-trips to the same
    /// StringContains filter with equal hashes.
    #[test]
    fn string_contains_reparse_is_stable(pattern in pattern_fragment()) {
        let resources = ResourceStore::new();
        let parser = FilterParser::new(&resources);

        let first = parser.parse_rule(&pattern);
        let second = parser.parse_rule(&first.rule_string);

        prop_assert_eq!(first.category, second.category);
        prop_assert_eq!(first.needle_hash, second.needle_hash);
        prop_assert_eq!(first.difference_hash, second.difference_hash);
    }

    /// Cosmetic hide rules round-trip their selector and domain list.
    #[test]
    fn cosmetic_hide_rule_reparse_is_stable(domain in domain_fragment(), selector in "[.][a-z]{3,10}") {
        let rule = format!("{domain}##{selector}");
        let resources = ResourceStore::new();
        let parser = FilterParser::new(&resources);

        let first = parser.parse_rule(&rule);
        let second = parser.parse_rule(&first.rule_string);

        prop_assert_eq!(first.category, second.category);
        prop_assert_eq!(first.eval_string, second.eval_string);
        prop_assert_eq!(first.domain_blacklist, second.domain_blacklist);
    }
}

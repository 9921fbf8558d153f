//! Property tests for the wildcard pattern matcher behind error
//! classification: classification must depend only on its inputs, never on
//! call history.

use gateway_health::config::MatchPatterns;
use proptest::prelude::*;

fn arb_candidate() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('0', '9'), 1..6)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Matching the same pattern list against the same candidate always
    /// yields the same verdict.
    #[test]
    fn matches_is_idempotent(
        patterns in proptest::collection::vec("[0-9xX]{1,5}", 0..4),
        candidate in arb_candidate(),
    ) {
        let m = MatchPatterns(patterns);
        let first = m.matches(&candidate);
        let second = m.matches(&candidate);
        prop_assert_eq!(first, second);
    }

    /// An empty candidate never matches, regardless of the configured
    /// pattern list.
    #[test]
    fn empty_candidate_never_matches(
        patterns in proptest::collection::vec("[0-9xX]{1,5}", 0..4),
    ) {
        let m = MatchPatterns(patterns);
        prop_assert!(!m.matches(""));
    }

    /// A pattern only ever matches candidates of its own length: padding or
    /// truncating the candidate can never flip a match to a non-match for
    /// reasons other than the length check itself.
    #[test]
    fn length_mismatch_never_matches(
        pattern in "[0-9]{3}",
        extra in "[0-9]{1,3}",
    ) {
        let m = MatchPatterns(vec![pattern.clone()]);
        let longer = format!("{pattern}{extra}");
        prop_assert!(!m.matches(&longer));
    }

    /// Swapping a digit's case in an all-wildcard pattern changes nothing:
    /// `x` and `X` are equivalent placeholders.
    #[test]
    fn wildcard_case_is_irrelevant(
        candidate in "[0-9]{3}",
        use_upper in any::<bool>(),
    ) {
        let wildcard = if use_upper { "XXX" } else { "xxx" };
        let m = MatchPatterns(vec![wildcard.to_string()]);
        prop_assert!(m.matches(&candidate));
    }
}

//! Property tests for record scoring and file classification.

use proptest::prelude::*;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;

use wildscan::core::criteria::normalize_at;
use wildscan::core::record::RecordMatcher;
use wildscan::core::{
    FileEvaluator, IgnoreRule, MatchRule, RawCriteria, SearchCriteria, Verdict,
};

fn criteria(
    search: &[String],
    ignore: &[String],
    match_rule: MatchRule,
    ignore_rule: IgnoreRule,
    ignore_case: bool,
) -> SearchCriteria {
    let raw = RawCriteria {
        search_path: std::env::temp_dir().to_string_lossy().into_owned(),
        search_strings: search.join(" "),
        ignore_strings: ignore.join(" "),
        delimiters: Some(",".to_string()),
        match_rule,
        ignore_rule,
        ignore_case_strings: ignore_case,
        ..Default::default()
    };
    normalize_at(&raw, chrono::Local::now()).expect("generated criteria are valid")
}

fn classify(criteria: &SearchCriteria, content: &str) -> Verdict {
    let cancel = AtomicBool::new(false);
    let (verdict, _) = FileEvaluator::new(criteria)
        .classify_reader(Cursor::new(content.as_bytes()), &cancel)
        .expect("in-memory reads cannot fail");
    verdict
}

fn pattern() -> impl Strategy<Value = String> {
    "[abcAB?*]{1,4}"
}

fn patterns(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(pattern(), 1..=max)
}

fn content() -> impl Strategy<Value = String> {
    prop::collection::vec("[abcAB ,]{0,16}", 0..8).prop_map(|lines| lines.join("\n"))
}

fn match_rule() -> impl Strategy<Value = MatchRule> {
    prop::sample::select(MatchRule::ALL.to_vec())
}

fn ignore_rule() -> impl Strategy<Value = IgnoreRule> {
    prop::sample::select(IgnoreRule::ALL.to_vec())
}

proptest! {
    #[test]
    fn record_counts_never_exceed_pattern_counts(
        search in patterns(4),
        ignore in patterns(4),
        record in "[abcAB ,]{0,24}",
        ignore_case in any::<bool>(),
    ) {
        let criteria = criteria(&search, &ignore, MatchRule::Any, IgnoreRule::Any, ignore_case);
        let state = RecordMatcher::from_criteria(&criteria).scan(&record);

        prop_assert!(state.match_count <= criteria.search_strings.len());
        prop_assert!(state.ignore_count <= criteria.ignore_strings.len());
    }

    #[test]
    fn classification_is_idempotent(
        search in patterns(3),
        ignore in prop::collection::vec(pattern(), 0..3),
        text in content(),
        match_rule in match_rule(),
        ignore_rule in ignore_rule(),
    ) {
        let criteria = criteria(&search, &ignore, match_rule, ignore_rule, false);
        let cancel = AtomicBool::new(false);
        let evaluator = FileEvaluator::new(&criteria);

        let first = evaluator.classify_reader(Cursor::new(text.as_bytes()), &cancel).unwrap();
        let second = evaluator.classify_reader(Cursor::new(text.as_bytes()), &cancel).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn case_insensitive_accepts_a_superset(
        search in patterns(3),
        text in content(),
        match_rule in match_rule(),
    ) {
        let sensitive = criteria(&search, &[], match_rule, IgnoreRule::Any, false);
        let insensitive = criteria(&search, &[], match_rule, IgnoreRule::Any, true);

        if classify(&sensitive, &text).is_accepted() {
            prop_assert!(classify(&insensitive, &text).is_accepted());
        }
    }

    #[test]
    fn all_in_record_never_accepts_what_any_rejects(
        search in patterns(3),
        ignore in prop::collection::vec(pattern(), 0..3),
        text in content(),
        ignore_rule in ignore_rule(),
    ) {
        let strict = criteria(&search, &ignore, MatchRule::AllInRecord, ignore_rule, false);
        let loose = criteria(&search, &ignore, MatchRule::Any, ignore_rule, false);

        if classify(&strict, &text).is_accepted() {
            prop_assert!(classify(&loose, &text).is_accepted());
        }
    }

    #[test]
    fn ignore_rule_is_irrelevant_without_ignore_strings(
        search in patterns(3),
        text in content(),
        match_rule in match_rule(),
    ) {
        let verdicts: Vec<Verdict> = IgnoreRule::ALL
            .iter()
            .map(|&rule| classify(&criteria(&search, &[], match_rule, rule, false), &text))
            .collect();

        for verdict in &verdicts[1..] {
            prop_assert_eq!(verdict, &verdicts[0]);
        }
    }
}

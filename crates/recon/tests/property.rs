// Property-based tests for sky codes and correction filtering.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use skylog_recon::corrections::{filter_corrections, merge_remote};
use skylog_recon::sky::{CompareMode, SkyCondition};

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_code() -> impl Strategy<Value = String> {
    "[0-9]{7}"
}

/// Sorted, deduplicated timestamps across a night (with pre-midnight negatives).
fn arb_times() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::btree_set(-20_000i64..40_000, 0..40).prop_map(|s| s.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn digits_round_trip(code in arb_code()) {
        let sky = SkyCondition::from_digits(&code).unwrap();
        prop_assert_eq!(sky.to_digits(true), code);
    }

    #[test]
    fn match_with_self_is_identity(code in arb_code(), w1 in 1u32..100_000, w2 in 1u32..100_000) {
        let sky = SkyCondition::from_digits(&code).unwrap();
        let (w1, w2) = (f64::from(w1), f64::from(w2));
        let out = SkyCondition::compare(&sky, &sky, w1, w2, CompareMode::Match).unwrap();
        prop_assert_eq!(out, sky);
    }

    #[test]
    fn twavg_stays_between_inputs(
        a in arb_code(),
        b in arb_code(),
        w1 in 1u32..10_000,
        w2 in 1u32..10_000,
    ) {
        let a = SkyCondition::from_digits(&a).unwrap();
        let b = SkyCondition::from_digits(&b).unwrap();
        let (w1, w2) = (f64::from(w1), f64::from(w2));
        let out = SkyCondition::compare(&a, &b, w1, w2, CompareMode::TimeWeighted).unwrap();
        for ((x, y), z) in a.fields().into_iter().zip(b.fields()).zip(out.fields()) {
            prop_assert!(x.min(y) <= z && z <= x.max(y));
        }
    }

    #[test]
    fn filter_corrections_is_idempotent(times in arb_times(), window in 1i64..2_000) {
        let once = filter_corrections(&times, window);
        let twice = filter_corrections(&once, window);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filtered_entries_are_spaced_by_window(times in arb_times(), window in 1i64..2_000) {
        let kept = filter_corrections(&times, window);
        for pair in kept.windows(2) {
            prop_assert!(pair[1] - pair[0] >= window);
        }
        if let Some(first) = times.first() {
            prop_assert_eq!(kept.first(), Some(first));
        }
    }

    #[test]
    fn merge_moves_without_duplication(
        local in arb_times(),
        remote in arb_times(),
        gap in 600i64..10_000,
    ) {
        // remote timestamps that coincide with local ones would be ambiguous
        let remote: Vec<i64> = remote.into_iter().filter(|r| !local.contains(r)).collect();
        let out = merge_remote(&local, &remote, gap);
        prop_assert_eq!(out.local.len() + out.remote.len(), local.len() + remote.len());
        prop_assert!(out.promoted.len() <= remote.len());
        prop_assert!(out.local.windows(2).all(|w| w[0] < w[1]));
    }
}

//! tests/api/algebra.rs
//!
//! Partial aggregates must merge to the same result however the records
//! were split into batches and however the batches were combined.
use proptest::prelude::*;
use trackstats::aggregate::{PartialAggregate, map_batch, merge_all, par_merge_all};
use trackstats::report::FinalReport;
use trackstats::tracks::TrackRecord;

use crate::helpers::track;

fn arb_length() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => (0u32..12, 0u32..60).prop_map(|(m, s)| format!("{m}:{s:02}")),
        1 => Just("garbage".to_string()),
        1 => Just(String::new()),
    ]
}

fn arb_record() -> impl Strategy<Value = TrackRecord> {
    (
        arb_length(),
        1995i32..2020,
        0i64..100,
        prop::sample::select(vec!["Yes", "No", "yes", "NO", "", "unknown"]),
        prop::sample::select(vec!["A", "B", "C", " D ", "A, B", "C,D"]),
        0u32..16,
    )
        .prop_map(|(length, year, popularity, explicit, artists, dance)| {
            // Sixteenths add up exactly, so regrouping can't introduce
            // rounding noise.
            track(
                &length,
                &format!("{year}-01-01"),
                popularity,
                explicit,
                artists,
                dance as f64 / 16.0,
            )
        })
}

fn arb_records() -> impl Strategy<Value = Vec<TrackRecord>> {
    prop::collection::vec(arb_record(), 0..80)
}

fn map_in_chunks(records: &[TrackRecord], size: usize) -> Vec<PartialAggregate> {
    records.chunks(size).map(map_batch).collect()
}

proptest! {
    #[test]
    fn any_partition_matches_a_single_pass(records in arb_records(), size in 1usize..16) {
        let single_pass = map_batch(&records);
        prop_assert_eq!(merge_all(map_in_chunks(&records, size)), single_pass);
    }

    #[test]
    fn merge_order_does_not_matter(records in arb_records(), size in 1usize..16) {
        let partials = map_in_chunks(&records, size);
        let forward = merge_all(partials.clone());
        let backward = merge_all(partials.clone().into_iter().rev());
        let tree = par_merge_all(partials);

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(&forward, &tree);
    }

    #[test]
    fn merge_is_associative(a in arb_records(), b in arb_records(), c in arb_records()) {
        let (a, b, c) = (map_batch(&a), map_batch(&b), map_batch(&c));
        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_is_commutative(a in arb_records(), b in arb_records()) {
        let (a, b) = (map_batch(&a), map_batch(&b));
        prop_assert_eq!(a.clone().merge(b.clone()), b.merge(a));
    }

    #[test]
    fn empty_batch_is_the_identity(records in arb_records()) {
        let aggregate = map_batch(&records);
        prop_assert_eq!(map_batch(&[]).merge(aggregate.clone()), aggregate);
    }

    #[test]
    fn two_partitions_finalize_identically(
        records in arb_records(),
        first in 1usize..16,
        second in 1usize..16,
    ) {
        let a = FinalReport::finalize(&merge_all(map_in_chunks(&records, first)));
        let b = FinalReport::finalize(&par_merge_all(map_in_chunks(&records, second)));
        prop_assert_eq!(a, b);
    }
}

#[test]
fn two_track_scenario_matches_as_one_or_two_batches() {
    let records = vec![
        track("3:30", "2010-01-01", 50, "No", "X", 0.8),
        track("2:30", "2013-01-01", 70, "Yes", "Y", 0.4),
    ];
    let one = FinalReport::finalize(&map_batch(&records));
    let two = FinalReport::finalize(&map_batch(&records[1..]).merge(map_batch(&records[..1])));

    assert_eq!(one, two);
    let json: serde_json::Value =
        serde_json::from_str(&one.to_json_pretty().expect("Failed to serialize"))
            .expect("Invalid JSON");
    assert_eq!(
        json,
        serde_json::json!({
            "total": 360,
            "average": 180.0,
            "artist-popularity": { "X": 50.0, "Y": 70.0 },
            "explicit-popularity": { "yes": 70.0, "no": 50.0 },
            "dancebyyear": { "before-2001": 0.0, "2001-2012": 0.8, "after-2012": 0.4 }
        })
    );
}

#[test]
fn collaborations_never_reach_artist_popularity() {
    let records = vec![
        track("1:00", "2005-01-01", 90, "Yes", "A, B", 0.5),
        track("1:00", "2005-01-01", 10, "No", "A", 0.25),
    ];
    let aggregate = map_batch(&records);
    let report = FinalReport::finalize(&aggregate);

    assert!(!aggregate.artist_counts.contains_key("A, B"));
    assert_eq!(report.artist_popularity, vec![("A".to_string(), 10.0)]);
    assert_eq!(report.total, 120);
    assert_eq!(report.explicit_popularity.yes, 90.0);
    assert_eq!(report.dancebyyear.from_2001_to_2012, 0.38);
}

//! src/aggregate.rs
//!
//! Per-batch summary statistics. Every field is a count or a sum over
//! disjoint sets of records, so aggregates of separate batches can be merged
//! in any order and any grouping and still agree with a single pass over
//! the whole dataset. A missing map key behaves as zero.
use crate::tracks::{ParsedTrack, TrackRecord};
use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatPair {
    pub popularity_sum: i64,
    pub count: u64,
}

impl StatPair {
    fn record(&mut self, popularity: i64) {
        self.popularity_sum += popularity;
        self.count += 1;
    }

    pub fn merge(self, other: Self) -> Self {
        StatPair {
            popularity_sum: self.popularity_sum + other.popularity_sum,
            count: self.count + other.count,
        }
    }

    /// Mean popularity, or 0 for an empty pair.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.popularity_sum as f64 / self.count as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartialAggregate {
    pub total_duration_seconds: f64,
    pub track_count: u64,
    pub artist_stats: HashMap<String, StatPair>,
    pub explicit_stats: HashMap<String, StatPair>,
    pub artist_counts: HashMap<String, u64>,
    pub danceability_sum_by_year: HashMap<i32, f64>,
    pub danceability_count_by_year: HashMap<i32, u64>,
}

impl PartialAggregate {
    pub fn record(&mut self, track: ParsedTrack) {
        self.track_count += 1;
        self.total_duration_seconds += track.duration_seconds as f64;
        self.explicit_stats
            .entry(track.explicit)
            .or_default()
            .record(track.popularity);
        *self.danceability_sum_by_year.entry(track.year).or_default() += track.danceability;
        *self.danceability_count_by_year.entry(track.year).or_default() += 1;

        if let Some(artist) = track.artist {
            *self.artist_counts.entry(artist.clone()).or_default() += 1;
            self.artist_stats
                .entry(artist)
                .or_default()
                .record(track.popularity);
        }
    }

    /// Commutative and associative; `PartialAggregate::default()` is the
    /// identity.
    pub fn merge(mut self, other: Self) -> Self {
        self.total_duration_seconds += other.total_duration_seconds;
        self.track_count += other.track_count;
        merge_map(&mut self.artist_stats, other.artist_stats, StatPair::merge);
        merge_map(&mut self.explicit_stats, other.explicit_stats, StatPair::merge);
        merge_map(&mut self.artist_counts, other.artist_counts, |a, b| a + b);
        merge_map(
            &mut self.danceability_sum_by_year,
            other.danceability_sum_by_year,
            |a, b| a + b,
        );
        merge_map(
            &mut self.danceability_count_by_year,
            other.danceability_count_by_year,
            |a, b| a + b,
        );
        self
    }
}

fn merge_map<K, V>(into: &mut HashMap<K, V>, from: HashMap<K, V>, combine: impl Fn(V, V) -> V)
where
    K: Eq + Hash,
    V: Default + Copy,
{
    for (key, value) in from {
        let slot = into.entry(key).or_default();
        *slot = combine(*slot, value);
    }
}

/// Folds one batch into its partial aggregate. Pure, so batches can be
/// mapped on any thread or machine.
pub fn map_batch(batch: &[TrackRecord]) -> PartialAggregate {
    batch
        .iter()
        .map(ParsedTrack::parse)
        .fold(PartialAggregate::default(), |mut aggregate, track| {
            aggregate.record(track);
            aggregate
        })
}

pub fn merge_all(aggregates: impl IntoIterator<Item = PartialAggregate>) -> PartialAggregate {
    aggregates
        .into_iter()
        .fold(PartialAggregate::default(), PartialAggregate::merge)
}

/// Tree-shaped parallel fold; the grouping is left to rayon.
pub fn par_merge_all(aggregates: Vec<PartialAggregate>) -> PartialAggregate {
    aggregates
        .into_par_iter()
        .reduce(PartialAggregate::default, PartialAggregate::merge)
}

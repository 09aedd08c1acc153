//! src/report.rs
use crate::aggregate::PartialAggregate;
use serde::ser::{SerializeMap, Serializer};

pub const TOP_ARTISTS: usize = 100;
pub const EXPLICIT_YES: &str = "yes";
pub const EXPLICIT_NO: &str = "no";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Before2001,
    From2001To2012,
    After2012,
}

impl Era {
    pub fn of_year(year: i32) -> Self {
        if year <= 2001 {
            Era::Before2001
        } else if year <= 2012 {
            Era::From2001To2012
        } else {
            Era::After2012
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ExplicitPopularity {
    pub yes: f64,
    pub no: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct DanceByEra {
    #[serde(rename = "before-2001")]
    pub before_2001: f64,
    #[serde(rename = "2001-2012")]
    pub from_2001_to_2012: f64,
    #[serde(rename = "after-2012")]
    pub after_2012: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FinalReport {
    pub total: u64,
    pub average: f64,
    /// Ranked by track count, most prolific first.
    #[serde(rename = "artist-popularity", serialize_with = "serialize_ranked")]
    pub artist_popularity: Vec<(String, f64)>,
    #[serde(rename = "explicit-popularity")]
    pub explicit_popularity: ExplicitPopularity,
    pub dancebyyear: DanceByEra,
}

impl FinalReport {
    #[tracing::instrument(name = "Finalize report", skip_all, fields(tracks = aggregate.track_count))]
    pub fn finalize(aggregate: &PartialAggregate) -> Self {
        let average = if aggregate.track_count == 0 {
            0.0
        } else {
            round2(aggregate.total_duration_seconds / aggregate.track_count as f64)
        };

        FinalReport {
            total: aggregate.total_duration_seconds as u64,
            average,
            artist_popularity: top_artists(aggregate, TOP_ARTISTS),
            explicit_popularity: explicit_popularity(aggregate),
            dancebyyear: dance_by_era(aggregate),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Two decimals, decided on the exact binary value. Exact ties go to the
/// even digit, so 0.125 becomes 0.12 and 2.675 (stored just below) 2.67.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Ties on track count go to the alphabetically first artist.
fn top_artists(aggregate: &PartialAggregate, limit: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(&String, u64)> = aggregate
        .artist_counts
        .iter()
        .map(|(artist, count)| (artist, *count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(artist, _)| {
            let stats = aggregate
                .artist_stats
                .get(artist)
                .copied()
                .unwrap_or_default();
            (artist.clone(), round2(stats.average()))
        })
        .collect()
}

fn explicit_popularity(aggregate: &PartialAggregate) -> ExplicitPopularity {
    let dropped: Vec<(&str, u64)> = aggregate
        .explicit_stats
        .iter()
        .filter(|(category, _)| !matches!(category.as_str(), EXPLICIT_YES | EXPLICIT_NO))
        .map(|(category, stats)| (category.as_str(), stats.count))
        .collect();
    if !dropped.is_empty() {
        tracing::warn!(
            categories = ?dropped,
            "Explicit categories other than yes/no are left out of the report"
        );
    }

    let average = |category: &str| {
        let stats = aggregate
            .explicit_stats
            .get(category)
            .copied()
            .unwrap_or_default();
        round2(stats.average())
    };
    ExplicitPopularity {
        yes: average(EXPLICIT_YES),
        no: average(EXPLICIT_NO),
    }
}

fn dance_by_era(aggregate: &PartialAggregate) -> DanceByEra {
    let mut buckets = [(0.0f64, 0u64); 3];
    for (year, sum) in &aggregate.danceability_sum_by_year {
        let count = aggregate
            .danceability_count_by_year
            .get(year)
            .copied()
            .unwrap_or(0);
        let bucket = &mut buckets[Era::of_year(*year) as usize];
        bucket.0 += sum;
        bucket.1 += count;
    }

    let average = |(sum, count): (f64, u64)| {
        if count == 0 {
            0.0
        } else {
            round2(sum / count as f64)
        }
    };
    DanceByEra {
        before_2001: average(buckets[Era::Before2001 as usize]),
        from_2001_to_2012: average(buckets[Era::From2001To2012 as usize]),
        after_2012: average(buckets[Era::After2012 as usize]),
    }
}

fn serialize_ranked<S>(ranked: &[(String, f64)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(ranked.len()))?;
    for (artist, popularity) in ranked {
        map.serialize_entry(artist, popularity)?;
    }
    map.end()
}

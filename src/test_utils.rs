//! src/test_utils.rs
use crate::tracks::TrackRecord;
use std::path::PathBuf;

pub fn test_data_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path
}

pub fn track(
    length: &str,
    release_date: &str,
    popularity: i64,
    explicit: &str,
    artists: &str,
    danceability: f64,
) -> TrackRecord {
    TrackRecord {
        length: Some(length.into()),
        release_date: Some(release_date.into()),
        popularity: Some(popularity.into()),
        explicit: Some(explicit.into()),
        artists: Some(artists.into()),
        danceability: Some(danceability.into()),
    }
}

pub fn scenario_records() -> Vec<TrackRecord> {
    vec![
        track("3:30", "2010-01-01", 50, "No", "X", 0.8),
        track("2:30", "2013-01-01", 70, "Yes", "Y", 0.4),
    ]
}

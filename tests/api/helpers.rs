//! tests/api/helpers.rs
use std::path::PathBuf;
use trackstats::tracks::TrackRecord;

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

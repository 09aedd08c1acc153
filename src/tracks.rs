//! src/tracks.rs
use std::borrow::Cow;

/// A raw field of a track record. The dataset is loose about types, so
/// numbers may arrive quoted and flags may arrive as booleans.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(text) => Cow::Borrowed(text),
            FieldValue::Int(value) => Cow::Owned(value.to_string()),
            FieldValue::Float(value) => Cow::Owned(value.to_string()),
            FieldValue::Bool(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Integers are taken as is; floats and numeric strings are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            FieldValue::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            FieldValue::Text(text) => {
                let text = text.trim();
                text.parse::<i64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|value| value.is_finite())
                        .map(|value| value.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    /// NaN and infinities count as unreadable.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Int(value) => Some(*value as f64),
            FieldValue::Float(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
            FieldValue::Bool(_) => None,
        };
        value.filter(|value| value.is_finite())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// One line of the input dataset. Every field may be missing; keys we don't
/// aggregate on are ignored.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackRecord {
    #[serde(rename = "Length", default, skip_serializing_if = "Option::is_none")]
    pub length: Option<FieldValue>,
    #[serde(rename = "Release Date", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<FieldValue>,
    #[serde(rename = "Popularity", default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<FieldValue>,
    #[serde(rename = "Explicit", default, skip_serializing_if = "Option::is_none")]
    pub explicit: Option<FieldValue>,
    #[serde(rename = "Artist(s)", default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<FieldValue>,
    #[serde(rename = "Danceability", default, skip_serializing_if = "Option::is_none")]
    pub danceability: Option<FieldValue>,
}

pub const DEFAULT_EXPLICIT: &str = "no";

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrack {
    pub duration_seconds: u64,
    /// 0 when the release date is missing or unreadable.
    pub year: i32,
    /// 0 unless the value fits in an `i32`.
    pub popularity: i64,
    /// Lower-cased, not restricted to "yes"/"no".
    pub explicit: String,
    /// `None` for collaborations (an artist field containing a comma).
    pub artist: Option<String>,
    pub danceability: f64,
}

impl ParsedTrack {
    /// Never fails: every unreadable field falls back to its zero value.
    pub fn parse(record: &TrackRecord) -> Self {
        let duration_seconds = record
            .length
            .as_ref()
            .map(|length| parse_duration(&length.as_text()))
            .unwrap_or(0);
        let year = record
            .release_date
            .as_ref()
            .map(|date| parse_year(&date.as_text()))
            .unwrap_or(0);
        let popularity = record
            .popularity
            .as_ref()
            .and_then(FieldValue::as_i64)
            .and_then(|popularity| i32::try_from(popularity).ok())
            .map(i64::from)
            .unwrap_or(0);
        let explicit = record
            .explicit
            .as_ref()
            .map(|flag| flag.as_text().to_lowercase())
            .unwrap_or_else(|| DEFAULT_EXPLICIT.to_string());
        let artist = match record.artists.as_ref().map(FieldValue::as_text) {
            Some(artists) if artists.contains(',') => None,
            Some(artists) => Some(artists.trim().to_string()),
            None => Some(String::new()),
        };
        let danceability = record
            .danceability
            .as_ref()
            .and_then(FieldValue::as_f64)
            .unwrap_or(0.0);

        ParsedTrack {
            duration_seconds,
            year,
            popularity,
            explicit,
            artist,
            danceability,
        }
    }

}

/// `minutes:seconds`; anything else counts as zero.
fn parse_duration(raw: &str) -> u64 {
    let Some((minutes, seconds)) = raw.trim().split_once(':') else {
        return 0;
    };
    match (minutes.trim().parse::<u64>(), seconds.trim().parse::<u64>()) {
        (Ok(minutes), Ok(seconds)) => minutes
            .checked_mul(60)
            .and_then(|minutes| minutes.checked_add(seconds))
            .unwrap_or(0),
        _ => 0,
    }
}

fn parse_year(raw: &str) -> i32 {
    let prefix: String = raw.chars().take(4).collect();
    prefix.trim().parse().unwrap_or(0)
}

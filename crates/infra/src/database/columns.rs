//! Column encodings shared by the repositories
//!
//! Wall-clock timestamps are stored as integer microseconds and embeddings
//! as little-endian `f32` blobs.

use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::Type;

/// Microseconds since the epoch, treating the wall-clock value as UTC.
pub fn to_micros(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_micros()
}

pub fn from_micros(value: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(value).map(|dt| dt.naive_utc())
}

/// Read a microsecond column back into a timestamp.
pub fn timestamp_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: i64 = row.get(index)?;
    from_micros(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Integer,
            format!("timestamp {raw} is out of range").into(),
        )
    })
}

pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

//! Persisted index format.
//!
//! A snapshot is a JSON object mapping decimal-string Unix timestamps to
//! integer heights:
//!
//! ```json
//! { "1694628304": 807500, "1694629434": 807501 }
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::error::SnapshotError;
use crate::history::HistoryIndex;
use crate::types::ReferencePoint;

/// Decoded snapshot contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    points: Vec<ReferencePoint>,
}

impl Snapshot {
    pub fn from_points(points: Vec<ReferencePoint>) -> Self {
        Self { points }
    }

    /// Capture every entry of an index.
    pub fn from_index(index: &HistoryIndex) -> Self {
        Self {
            points: index.points().collect(),
        }
    }

    /// Parse the JSON object form.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::Json`] if the text is not a `string → integer` object
    /// - [`SnapshotError::InvalidTimestamp`] if a key is not a decimal integer
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let raw: BTreeMap<String, u64> =
            serde_json::from_str(json).map_err(|e| SnapshotError::Json(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Parse a snapshot from any reader (e.g. an open file).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let raw: BTreeMap<String, u64> = serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() {
                SnapshotError::Io(e.to_string())
            } else {
                SnapshotError::Json(e.to_string())
            }
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: BTreeMap<String, u64>) -> Result<Self, SnapshotError> {
        let points = raw
            .into_iter()
            .map(|(key, height)| {
                key.trim()
                    .parse::<i64>()
                    .map(|timestamp| ReferencePoint::new(height, timestamp))
                    .map_err(|_| SnapshotError::InvalidTimestamp(key))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    /// Serialize to the JSON object form with sorted keys.
    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(&self.as_map()).map_err(|e| SnapshotError::Json(e.to_string()))
    }

    /// Write the JSON object form to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        serde_json::to_writer(writer, &self.as_map()).map_err(|e| SnapshotError::Io(e.to_string()))
    }

    fn as_map(&self) -> BTreeMap<String, u64> {
        self.points
            .iter()
            .map(|p| (p.timestamp.to_string(), p.height))
            .collect()
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<ReferencePoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

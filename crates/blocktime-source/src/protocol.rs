//! Wire types shared by the HTTP client and the push feed.
//!
//! Block payloads carry many fields; only `height` and `timestamp` are read.
//! The timestamp arrives as a JSON integer from most endpoints and as a
//! decimal string from some, so both are accepted.

use blocktime_core::error::FeedError;
use blocktime_core::types::ReferencePoint;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic name subscribed to on the push channel.
pub const NEW_BLOCKS_TOPIC: &str = "blocks";

/// A block as it appears in API responses and push frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WireBlock {
    pub height: u64,
    #[serde(deserialize_with = "timestamp_from_str_or_int")]
    pub timestamp: i64,
}

impl From<WireBlock> for ReferencePoint {
    fn from(block: WireBlock) -> Self {
        ReferencePoint::new(block.height, block.timestamp)
    }
}

fn timestamp_from_str_or_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct TimestampVisitor;

    impl Visitor<'_> for TimestampVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a unix timestamp as integer or decimal string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("timestamp out of range: {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid timestamp string: {v:?}")))
        }
    }

    deserializer.deserialize_any(TimestampVisitor)
}

/// Outbound control frame: `{"action": ..., "data": [...]}`.
#[derive(Debug, Serialize)]
struct ControlFrame<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a [&'a str]>,
}

/// The two control frames sent after connecting: the init handshake, then
/// the subscription to new blocks.
///
/// # Errors
///
/// [`FeedError::Send`] if a frame cannot be serialized.
pub fn subscribe_frames() -> Result<Vec<String>, FeedError> {
    let frames = [
        ControlFrame { action: "init", data: None },
        ControlFrame { action: "want", data: Some(&[NEW_BLOCKS_TOPIC]) },
    ];
    frames
        .iter()
        .map(|frame| serde_json::to_string(frame).map_err(|e| FeedError::Send(e.to_string())))
        .collect()
}

/// Inbound frame. Frames for other topics carry neither field.
#[derive(Debug, Deserialize)]
struct PushFrame {
    block: Option<WireBlock>,
    blocks: Option<Vec<WireBlock>>,
}

/// Decode an inbound push frame into reference points.
///
/// A frame may announce a single `block`, a batch of `blocks`, or neither
/// (other topics), in which case the result is empty.
///
/// # Errors
///
/// [`FeedError::Decode`] if the frame is not a JSON object or a block entry
/// is malformed.
pub fn decode_frame(text: &str) -> Result<Vec<ReferencePoint>, FeedError> {
    let frame: PushFrame =
        serde_json::from_str(text).map_err(|e| FeedError::Decode(e.to_string()))?;

    let mut points: Vec<ReferencePoint> = frame
        .blocks
        .unwrap_or_default()
        .into_iter()
        .map(ReferencePoint::from)
        .collect();
    if let Some(block) = frame.block {
        points.push(block.into());
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_frames_shape() {
        let frames = subscribe_frames().unwrap();
        assert_eq!(frames, vec![
            r#"{"action":"init"}"#.to_string(),
            r#"{"action":"want","data":["blocks"]}"#.to_string(),
        ]);
    }

    #[test]
    fn wire_block_integer_timestamp() {
        let block: WireBlock = serde_json::from_str(
            r#"{"id":"00000000000000000002","height":807507,"timestamp":1694632075,"tx_count":3}"#,
        )
        .unwrap();
        assert_eq!(ReferencePoint::from(block), ReferencePoint::new(807_507, 1_694_632_075));
    }

    #[test]
    fn wire_block_string_timestamp() {
        let block: WireBlock =
            serde_json::from_str(r#"{"height":5,"timestamp":"1694632075"}"#).unwrap();
        assert_eq!(block.timestamp, 1_694_632_075);
    }

    #[test]
    fn wire_block_rejects_garbage_timestamp() {
        assert!(serde_json::from_str::<WireBlock>(r#"{"height":5,"timestamp":"soon"}"#).is_err());
        assert!(serde_json::from_str::<WireBlock>(r#"{"height":5,"timestamp":null}"#).is_err());
    }

    #[test]
    fn decode_single_block_frame() {
        let points = decode_frame(r#"{"block":{"height":900000,"timestamp":1748000000}}"#).unwrap();
        assert_eq!(points, vec![ReferencePoint::new(900_000, 1_748_000_000)]);
    }

    #[test]
    fn decode_batch_frame() {
        let points = decode_frame(
            r#"{"blocks":[{"height":1,"timestamp":10},{"height":2,"timestamp":"20"}],"conversions":{}}"#,
        )
        .unwrap();
        assert_eq!(points, vec![ReferencePoint::new(1, 10), ReferencePoint::new(2, 20)]);
    }

    #[test]
    fn decode_other_topic_is_empty() {
        assert!(decode_frame(r#"{"mempoolInfo":{"size":1}}"#).unwrap().is_empty());
    }

    #[test]
    fn decode_non_object_fails() {
        assert!(matches!(decode_frame("not json"), Err(FeedError::Decode(_))));
    }
}

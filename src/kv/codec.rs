//! Cache payload codec: JSON, then Snappy.
//!
//! A small versioned envelope (schema version tag + raw bytes):
//! `serde_json` for the shape, `snap` (Snappy) for the bytes on the wire
//! to Redis.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::KvError;

const SCHEMA_VERSION: u8 = 1;

/// Encode a value as versioned, Snappy-compressed JSON.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, KvError> {
    let json = serde_json::to_vec(value).map_err(|e| KvError::Codec(e.to_string()))?;

    let mut encoder = snap::raw::Encoder::new();
    let compressed = encoder
        .compress_vec(&json)
        .map_err(|e| KvError::Codec(e.to_string()))?;

    let mut framed = Vec::with_capacity(compressed.len() + 1);
    framed.push(SCHEMA_VERSION);
    framed.extend_from_slice(&compressed);
    Ok(framed)
}

/// Decode a payload produced by [`encode`]. Rejects payloads from a
/// schema version this build doesn't understand.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, KvError> {
    let (version, body) = bytes
        .split_first()
        .ok_or_else(|| KvError::Codec("empty payload".to_string()))?;

    if *version != SCHEMA_VERSION {
        return Err(KvError::Codec(format!(
            "unsupported cache payload schema version {version}"
        )));
    }

    let mut decoder = snap::raw::Decoder::new();
    let json = decoder
        .decompress_vec(body)
        .map_err(|e| KvError::Codec(e.to_string()))?;

    serde_json::from_slice(&json).map_err(|e| KvError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        id: u32,
        name: String,
    }

    #[test]
    fn round_trips() {
        let value = Sample {
            id: 7,
            name: "go".to_string(),
        };
        let encoded = encode(&value).unwrap();
        let decoded: Sample = decode(&encoded).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let mut bytes = encode(&Sample { id: 1, name: "x".to_string() }).unwrap();
        bytes[0] = 99;
        let result: Result<Sample, _> = decode(&bytes);
        assert!(result.is_err());
    }
}

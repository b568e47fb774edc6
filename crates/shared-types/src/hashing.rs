//! # Canonical Content Hashing
//!
//! SHA-256 over UTF-8 JSON with lexicographically sorted object keys and no
//! insignificant whitespace, rendered as lowercase hex.
//!
//! Every immutable record (block headers, votes, slashing events, bundles,
//! replay verifications) exposes its fields through [`CanonicalRecord`] and
//! is addressed by the hash of exactly those fields. Peers running other
//! implementations recompute these digests, so the byte layout produced by
//! [`canonical_json`] is part of the external contract.

use crate::errors::HashingError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 digest, displayed and serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// The all-zero digest, used as the parent of the first block.
    pub const ZERO: ContentHash = ContentHash([0u8; 32]);

    /// Hash raw bytes.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        ContentHash(hasher.finalize().into())
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, HashingError> {
        let bytes = hex::decode(s).map_err(|e| HashingError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HashingError::InvalidHex(format!("expected 32 bytes: {s}")))?;
        Ok(ContentHash(arr))
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl From<ContentHash> for Value {
    fn from(hash: ContentHash) -> Self {
        Value::String(hash.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Rebuild `value` with every object's keys in lexicographic order.
///
/// Insertion order is made explicit so the output does not depend on
/// whether `serde_json` was built with `preserve_order`.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Canonical JSON text: sorted keys, compact separators.
pub fn canonical_json(value: &Value) -> String {
    // `Display` for `Value` is the compact writer.
    sorted(value).to_string()
}

/// SHA-256 of [`canonical_json`].
pub fn canonical_hash(value: &Value) -> ContentHash {
    ContentHash::digest(canonical_json(value).as_bytes())
}

/// Canonical hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> Result<ContentHash, HashingError> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_hash(&value))
}

/// An immutable, content-addressed record.
///
/// `record_fields` returns the hashed fields; `to_record` returns the same
/// map with the digest appended under [`CanonicalRecord::HASH_KEY`].
pub trait CanonicalRecord {
    /// Name of the trailing digest field, e.g. `block_hash`.
    const HASH_KEY: &'static str;

    /// The fields covered by the digest.
    fn record_fields(&self) -> Map<String, Value>;

    fn record_hash(&self) -> ContentHash {
        canonical_hash(&Value::Object(self.record_fields()))
    }

    fn to_record(&self) -> Map<String, Value> {
        let mut fields = self.record_fields();
        let hash = canonical_hash(&Value::Object(fields.clone()));
        fields.insert(Self::HASH_KEY.to_string(), hash.into());
        fields
    }
}

/// Recompute the digest of a serialized record, ignoring its hash field.
///
/// Used by receivers to check that a record they were handed is
/// self-consistent.
pub fn verify_record(record: &Map<String, Value>, hash_key: &str) -> bool {
    let Some(Value::String(claimed)) = record.get(hash_key) else {
        return false;
    };
    let mut fields = record.clone();
    fields.remove(hash_key);
    canonical_hash(&Value::Object(fields)).to_hex() == *claimed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({"b": 1, "a": {"z": true, "m": [ {"y": 1, "x": 2} ]}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"m":[{"x":2,"y":1}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_canonical_hash_known_vector() {
        // sha256 of the two bytes "{}"
        assert_eq!(
            canonical_hash(&json!({})).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_key_order_does_not_change_hash() {
        let a = json!({"height": 1, "round": 0});
        let b = json!({"round": 0, "height": 1});
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn test_content_hash_hex_round_trip() {
        let hash = ContentHash::digest(b"sovereign");
        let parsed = ContentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(ContentHash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_content_hash_serializes_as_hex_string() {
        let hash = ContentHash::ZERO;
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "0".repeat(64)));
    }

    struct Pair {
        left: u64,
        right: u64,
    }

    impl CanonicalRecord for Pair {
        const HASH_KEY: &'static str = "pair_hash";

        fn record_fields(&self) -> Map<String, Value> {
            let mut m = Map::new();
            m.insert("left".into(), json!(self.left));
            m.insert("right".into(), json!(self.right));
            m
        }
    }

    #[test]
    fn test_record_hash_verifies() {
        let record = Pair { left: 3, right: 4 }.to_record();
        assert!(verify_record(&record, "pair_hash"));

        let mut tampered = record.clone();
        tampered.insert("left".into(), json!(5));
        assert!(!verify_record(&tampered, "pair_hash"));
    }

    #[test]
    fn test_content_hash_matches_json_form() {
        #[derive(Serialize)]
        struct Snapshot {
            round: u32,
            height: u64,
        }
        let typed = content_hash(&Snapshot { round: 0, height: 9 }).unwrap();
        assert_eq!(typed, canonical_hash(&json!({"height": 9, "round": 0})));
    }
}

//! Base64url and JSON encoding of token segments.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use serde_json::{Map, Value};

use core::fmt;

use crate::EncodingError;

/// Encodes bytes as base64url with no padding.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(bytes.as_ref())
}

/// Decodes a base64url string with no padding. Padding characters and characters
/// outside the URL-safe alphabet are rejected.
///
/// # Errors
///
/// Returns [`EncodingError::Base64`] if `encoded` is not valid unpadded base64url.
pub fn base64url_decode(encoded: &str) -> Result<Vec<u8>, EncodingError> {
    Base64UrlUnpadded::decode_vec(encoded).map_err(EncodingError::from)
}

/// Serializes a value into compact JSON and encodes it as a base64url token segment.
/// Object fields keep their insertion order.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_vec(value).map(base64url_encode)
}

/// Decodes a base64url token segment into a JSON object. Non-object values and objects
/// with duplicate keys are rejected.
///
/// # Errors
///
/// Returns [`EncodingError::Base64`] if `segment` is not valid base64url, and
/// [`EncodingError::MalformedJson`] if the decoded bytes are not a JSON object.
pub fn decode_json(segment: &str) -> Result<Map<String, Value>, EncodingError> {
    let bytes = base64url_decode(segment)?;
    parse_object(&bytes)
}

/// Parses a JSON object from raw bytes, with the same rules as [`decode_json()`].
fn parse_object(json: &[u8]) -> Result<Map<String, Value>, EncodingError> {
    serde_json::from_slice::<StrictObject>(json)
        .map(|object| object.0)
        .map_err(EncodingError::MalformedJson)
}

/// Top-level JSON object that refuses duplicate keys. Nested values are parsed as usual.
struct StrictObject(Map<String, Value>);

impl<'de> Deserialize<'de> for StrictObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectVisitor;

        impl<'de> Visitor<'de> for ObjectVisitor {
            type Value = StrictObject;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = Map::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    if map.contains_key(&key) {
                        return Err(de::Error::custom(format_args!("duplicate field `{key}`")));
                    }
                    map.insert(key, value);
                }
                Ok(StrictObject(map))
            }
        }

        deserializer.deserialize_map(ObjectVisitor)
    }
}

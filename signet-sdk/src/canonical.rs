//! Canonical payload encoding and integrity checksums.
//!
//! Every stored event carries a checksum over the *canonical* encoding of
//! its payload, so that re-encoding the same logical value always
//! reproduces the same bytes. The encoding is compact JSON with:
//!
//! * object keys sorted by byte order, at every depth;
//! * no insignificant whitespace;
//! * strings and numbers rendered exactly as `serde_json` renders them.
//!
//! The checksum is the lowercase hex SHA-256 digest of those bytes:
//!
//! ```text
//! checksum = hex(SHA-256(canonical(payload)))
//! ```

use serde_json::Value;

/// An opaque structured payload: a JSON object of arbitrary depth.
pub type Payload = serde_json::Map<String, Value>;

/// Length of a hex-encoded SHA-256 digest.
pub const CHECKSUM_HEX_LEN: usize = 64;

/// Errors produced while encoding or decoding canonical payloads.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a payload into its canonical byte form.
pub fn encode_canonical(payload: &Payload) -> Result<Vec<u8>, CanonicalError> {
    let mut out = Vec::with_capacity(256);
    write_object(payload, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
            Ok(())
        }
        scalar => serde_json::to_writer(&mut *out, scalar),
    }
}

// The map's own iteration order is not relied upon: with serde_json's
// `preserve_order` feature unified in, it would be insertion order.
fn write_object(map: &Payload, out: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        serde_json::to_writer(&mut *out, key)?;
        out.push(b':');
        write_value(value, out)?;
    }
    out.push(b'}');
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode bytes previously produced by [`encode_canonical`].
///
/// Any JSON object is accepted; the result is the logical value, so
/// re-encoding it yields canonical bytes even if the input was not.
pub fn decode_payload(bytes: &[u8]) -> Result<Payload, CanonicalError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(CanonicalError::NotAnObject),
    }
}

// ---------------------------------------------------------------------------
// Checksums
// ---------------------------------------------------------------------------

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, bytes);
    hex::encode(digest.as_ref())
}

/// Check `bytes` against a hex checksum (case-insensitive).
pub fn verify_checksum(bytes: &[u8], expected: &str) -> bool {
    expected.len() == CHECKSUM_HEX_LEN && checksum(bytes).eq_ignore_ascii_case(expected)
}

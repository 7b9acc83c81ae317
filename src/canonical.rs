//! Structural equality and canonical hashing for JSON values.
//!
//! ## Equality Rules
//!
//! - Objects compare as unordered maps: same key set, equal values per key
//! - Arrays compare element-wise in index order
//! - Numbers compare numerically, so `1` equals `1.0`
//! - Everything else compares by value
//!
//! ## Fingerprints
//!
//! Hashes are computed over `serde_json` bytes of values whose field order is
//! fixed by the caller (sorted maps or vectors), never over `Value` objects
//! that preserve insertion order.

use serde::Serialize;
use serde_json::{Number, Value};
use xxhash_rust::xxh64::xxh64;

use crate::error::Result;

/// Deep structural equality between two JSON values.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => false,
    }
}

fn number_eq(x: &Number, y: &Number) -> bool {
    if x == y {
        return true;
    }
    // Integers that fit exactly are compared without float rounding.
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Serialize a value to JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64> {
    let bytes = to_canonical_bytes(value)?;
    Ok(xxh64(&bytes, 0))
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}

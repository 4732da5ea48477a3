//! Cache key construction
//!
//! Tool results are only safe to reuse when the key captures every input
//! that influenced them, so callers build keys from the tool name, the
//! working directory, and the full argument set.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Hash a JSON value into a stable 64-bit digest
///
/// Object members are visited in sorted key order, so two maps holding the
/// same entries hash identically no matter how they were built. Array order
/// stays significant.
pub fn hash_json(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    walk(value, &mut hasher);
    hasher.finish()
}

// One tag byte per JSON type keeps the string "1" and the number 1 from
// colliding.
fn walk<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(b'n'),
        Value::Bool(b) => {
            state.write_u8(b'b');
            state.write_u8(*b as u8);
        }
        Value::Number(n) => {
            state.write_u8(b'#');
            // serde_json renders numbers canonically
            n.to_string().hash(state);
        }
        Value::String(s) => {
            state.write_u8(b's');
            s.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(b'[');
            state.write_usize(items.len());
            for item in items {
                walk(item, state);
            }
        }
        Value::Object(members) => {
            state.write_u8(b'{');
            state.write_usize(members.len());
            let mut sorted: Vec<(&String, &Value)> = members.iter().collect();
            sorted.sort_by_key(|(key, _)| *key);
            for (key, value) in sorted {
                key.hash(state);
                walk(value, state);
            }
        }
    }
}

/// A cache key built from multiple components
///
/// String components stay readable in the final key; JSON arguments are
/// folded into a canonical hash so that equal argument sets produce equal
/// keys regardless of object key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    parts: Vec<String>,
}

impl CacheKey {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append a readable component, e.g. a tool name or working directory
    pub fn push_str(&mut self, s: &str) {
        self.parts.push(s.to_string());
    }

    /// Append a JSON argument set as a canonical hash
    pub fn push_json(&mut self, value: &Value) {
        self.parts.push(format!("{:016x}", hash_json(value)));
    }

    /// Build the final key
    pub fn finalize(&self) -> String {
        self.parts.join(":")
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

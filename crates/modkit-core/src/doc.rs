//! Borrowed access to raw response documents.
//!
//! Every record handed to a continuation carries a [`Doc`] pointing back
//! into the parsed response. The service returns far more fields than the
//! typed records surface; `Doc` lets callers read those late-bound fields
//! without the library having to model all of them.
//!
//! A `Doc` borrows the parse buffer, which is dropped when the
//! continuation returns. The borrow checker enforces what the C original
//! could only document: handles cannot outlive the callback.

use serde_json::Value;

/// Read-only view of one object inside the parsed response document.
#[derive(Clone, Copy, Debug)]
pub struct Doc<'doc> {
    node: &'doc Value,
}

impl<'doc> Doc<'doc> {
    /// Wrap a node of the parsed document.
    #[must_use]
    pub const fn new(node: &'doc Value) -> Self {
        Self { node }
    }

    /// The underlying JSON node.
    #[must_use]
    pub const fn node(&self) -> &'doc Value {
        self.node
    }

    /// String field, or `""` when absent or not a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> &'doc str {
        self.node.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Signed integer field, or `0` when absent or not an integer.
    #[must_use]
    pub fn get_int(&self, key: &str) -> i64 {
        self.node.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Float field, or `0.0` when absent or not a number.
    #[must_use]
    pub fn get_float(&self, key: &str) -> f64 {
        self.node.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Boolean field, or `false` when absent or not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.node.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Nested object field, if present.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<Doc<'doc>> {
        self.node
            .get(key)
            .filter(|v| v.is_object())
            .map(Self::new)
    }
}

//! Native values passed into and returned from calls
//!
//! Arguments are supplied as `Value`s and results come back as `Value`s.
//! Integers travel as `i64` and floats as `f64`; the marshaler narrows them
//! to the width the signature declares.

use crate::error::{BridgeError, BridgeResult};
use crate::handle::OpaqueHandle;

/// Dynamically typed native value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Result of a `void` call
    Void,
    /// Null reference
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Any integer primitive, including `char` code units
    Int(i64),
    /// `float` or `double`
    Float(f64),
    /// Text
    Str(String),
    /// Non-string foreign object
    Object(OpaqueHandle),
}

impl Value {
    /// Kind name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as text if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the handle if this is an object
    pub fn as_object(&self) -> Option<&OpaqueHandle> {
        match self {
            Value::Object(handle) => Some(handle),
            _ => None,
        }
    }
}

// ============================================================================
// Rust -> Value
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! int_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Value::Int(i as i64)
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<OpaqueHandle> for Value {
    fn from(handle: OpaqueHandle) -> Self {
        Value::Object(handle)
    }
}

impl From<&OpaqueHandle> for Value {
    fn from(handle: &OpaqueHandle) -> Self {
        Value::Object(handle.clone())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Value -> Rust
// ============================================================================

/// Convert a decoded result into a Rust type.
pub trait FromValue: Sized {
    /// Convert, returning an error if the kind doesn't match.
    fn from_value(value: Value) -> BridgeResult<Self>;
}

fn mismatch(expected: &str, value: &Value) -> BridgeError {
    BridgeError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> BridgeResult<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> BridgeResult<Self> {
        match value {
            Value::Void => Ok(()),
            other => Err(mismatch("void", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> BridgeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> BridgeResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", &value))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> BridgeResult<Self> {
        let i = i64::from_value(value)?;
        i32::try_from(i).map_err(|_| BridgeError::TypeMismatch {
            expected: "i32".to_string(),
            got: format!("int {}", i),
        })
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> BridgeResult<Self> {
        value.as_float().ok_or_else(|| mismatch("float", &value))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> BridgeResult<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for OpaqueHandle {
    fn from_value(value: Value) -> BridgeResult<Self> {
        match value {
            Value::Object(handle) => Ok(handle),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> BridgeResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_value() {
        assert_eq!(Value::from(42i32).as_int(), Some(42));
        assert_eq!(Value::from(-1i8).as_int(), Some(-1));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(2.5f32).as_float(), Some(2.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert!(Value::from(None::<String>).is_null());
        assert_eq!(Value::from(Some("x")).as_str(), Some("x"));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(i32::from_value(Value::Int(7)).unwrap(), 7);
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
        assert_eq!(String::from_value(Value::Str("a".into())).unwrap(), "a");
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert!(bool::from_value(Value::Int(1)).is_err());
        assert!(<()>::from_value(Value::Void).is_ok());
    }
}

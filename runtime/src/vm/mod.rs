use crate::error::RuntimeError;
use crate::rt::field::WidthClass;

/// A primitive value moving in or out of field storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Long(i64),
}

impl Value {
    pub fn width(&self) -> WidthClass {
        match self {
            Value::Int(_) => WidthClass::Word32,
            Value::Long(_) => WidthClass::Word64,
        }
    }

    /// Zero of the given width, the value every fresh field reads as.
    pub fn zero(width: WidthClass) -> Self {
        match width {
            WidthClass::Word32 => Value::Int(0),
            WidthClass::Word64 => Value::Long(0),
        }
    }

    pub fn as_int(&self) -> Result<i32, RuntimeError> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(RuntimeError::WidthMismatch {
                expected: WidthClass::Word32,
                actual: other.width(),
            }),
        }
    }

    pub fn as_long(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Long(v) => Ok(*v),
            other => Err(RuntimeError::WidthMismatch {
                expected: WidthClass::Word64,
                actual: other.width(),
            }),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

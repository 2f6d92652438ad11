use crate::error::RuntimeError;
use crate::keys::{ClassId, FieldKey, Symbol};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::Display;

/// Storage size category of a primitive field. The discriminant is the size in bytes,
/// which is also the required alignment.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum WidthClass {
    Word32 = 4,
    Word64 = 8,
}

impl WidthClass {
    pub fn byte_size(self) -> usize {
        u8::from(self) as usize
    }

    pub fn alignment(self) -> usize {
        self.byte_size()
    }

    /// Width of a primitive field descriptor, e.g. `I` or `J`.
    pub fn from_descriptor(desc: &str) -> Result<Self, RuntimeError> {
        match desc {
            "I" | "F" | "Z" | "B" | "C" | "S" => Ok(WidthClass::Word32),
            "J" | "D" => Ok(WidthClass::Word64),
            other => Err(RuntimeError::UnsupportedDescriptor(other.to_string())),
        }
    }
}

impl Display for WidthClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthClass::Word32 => write!(f, "word32"),
            WidthClass::Word64 => write!(f, "word64"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldScope {
    Instance,
    Static,
}

impl Display for FieldScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldScope::Instance => write!(f, "instance"),
            FieldScope::Static => write!(f, "static"),
        }
    }
}

/// A field as declared by the class-loading side, before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: Symbol,
    pub width: WidthClass,
    pub scope: FieldScope,
}

impl FieldSpec {
    pub fn instance(name: Symbol, width: WidthClass) -> Self {
        Self {
            name,
            width,
            scope: FieldScope::Instance,
        }
    }

    pub fn class(name: Symbol, width: WidthClass) -> Self {
        Self {
            name,
            width,
            scope: FieldScope::Static,
        }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey {
            name: self.name,
            scope: self.scope,
        }
    }
}

/// Resolved field: where it lives and how wide it is. Immutable once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub owning_class: ClassId,
    pub name: Symbol,
    pub width: WidthClass,
    pub scope: FieldScope,
    pub offset: usize,
}

impl FieldDescriptor {
    pub fn is_static(&self) -> bool {
        self.scope == FieldScope::Static
    }

    pub fn key(&self) -> FieldKey {
        FieldKey {
            name: self.name,
            scope: self.scope,
        }
    }
}

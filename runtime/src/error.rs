use crate::keys::{ClassId, ObjectId, Symbol};
use crate::rt::field::{FieldScope, WidthClass};
use lasso::ThreadedRodeo;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    DuplicateField {
        class_id: ClassId,
        name: Symbol,
        scope: FieldScope,
    },
    UnknownField {
        class_id: ClassId,
        name: String,
    },
    Alignment {
        offset: usize,
        width: WidthClass,
        region_size: usize,
    },
    WidthMismatch {
        expected: WidthClass,
        actual: WidthClass,
    },
    UnknownClass(ClassId),
    ClassAlreadyRegistered(ClassId),
    MissingInstance {
        class_id: ClassId,
        name: Symbol,
    },
    IncompatibleInstance {
        expected: ClassId,
        actual: ClassId,
    },
    UnsupportedDescriptor(String),
    UnknownObject(ObjectId),
    ObjectAlreadyAttached(ObjectId),
    ClassNotFound(Symbol),
    ClassCircularity(Symbol),
    ClassIdExhausted,
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for RuntimeError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        RuntimeError::Poisoned
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Alignment {
                offset,
                width,
                region_size,
            } => write!(
                f,
                "{width} access at offset {offset} is misaligned or exceeds region of {region_size} bytes"
            ),
            RuntimeError::WidthMismatch { expected, actual } => {
                write!(f, "width mismatch: expected {expected}, found {actual}")
            }
            RuntimeError::UnknownField { class_id, name } => {
                write!(f, "no field \"{name}\" in class {class_id}")
            }
            RuntimeError::UnknownClass(class_id) => write!(f, "unknown class {class_id}"),
            RuntimeError::ClassAlreadyRegistered(class_id) => {
                write!(f, "class {class_id} is already registered")
            }
            RuntimeError::IncompatibleInstance { expected, actual } => write!(
                f,
                "instance of class {actual} is not compatible with class {expected}"
            ),
            RuntimeError::UnsupportedDescriptor(desc) => {
                write!(f, "unsupported field descriptor \"{desc}\"")
            }
            RuntimeError::UnknownObject(object_id) => write!(f, "unknown object {object_id}"),
            RuntimeError::ObjectAlreadyAttached(object_id) => {
                write!(f, "object {object_id} already has storage attached")
            }
            RuntimeError::Poisoned => write!(f, "lock poisoned"),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl RuntimeError {
    pub fn into_pretty_string(self, interner: &ThreadedRodeo) -> String {
        match self {
            RuntimeError::DuplicateField {
                class_id,
                name,
                scope,
            } => format!(
                "duplicate {scope} field \"{}\" in class {class_id}",
                interner.resolve(&name)
            ),
            RuntimeError::MissingInstance { class_id, name } => format!(
                "instance field \"{}\" of class {class_id} accessed without an instance",
                interner.resolve(&name)
            ),
            RuntimeError::ClassNotFound(name) => {
                format!("class \"{}\" not found", interner.resolve(&name))
            }
            RuntimeError::ClassCircularity(name) => {
                format!("class \"{}\" is its own super class", interner.resolve(&name))
            }
            other => other.to_string(),
        }
    }
}

use crate::debug_log;
use crate::error::RuntimeError;
use crate::heap::{InstanceStorage, ObjectLayoutManager};
use crate::interpreter::handlers::*;
use crate::rt::field::{FieldDescriptor, WidthClass};
use crate::vm::Value;

mod handlers;

/// Where a stored value comes from.
#[derive(Debug, Clone, Copy)]
pub enum FieldSource<'a> {
    /// A literal from the instruction stream.
    Const(Value),
    /// A value held by the caller, e.g. a local variable slot.
    Local(Value),
    InstanceField {
        field: FieldDescriptor,
        instance: &'a InstanceStorage,
    },
    StaticField(FieldDescriptor),
}

impl FieldSource<'_> {
    pub fn width(&self) -> WidthClass {
        match self {
            FieldSource::Const(value) | FieldSource::Local(value) => value.width(),
            FieldSource::InstanceField { field, .. } | FieldSource::StaticField(field) => {
                field.width
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldOp<'a> {
    Put {
        dest: FieldDescriptor,
        instance: Option<&'a InstanceStorage>,
        source: FieldSource<'a>,
    },
    Get {
        field: FieldDescriptor,
        instance: Option<&'a InstanceStorage>,
    },
}

/// Typed get/put on resolved fields. Every operation is one storage touch; on error nothing
/// has been written.
pub struct FieldAccess<'a> {
    layout: &'a ObjectLayoutManager,
}

impl<'a> FieldAccess<'a> {
    pub fn new(layout: &'a ObjectLayoutManager) -> Self {
        Self { layout }
    }

    /// Runs one operation; `Get` yields the loaded value.
    pub fn execute(&self, op: FieldOp) -> Result<Option<Value>, RuntimeError> {
        match op {
            FieldOp::Put {
                dest,
                instance,
                source,
            } => self.put(&dest, instance, source).map(|_| None),
            FieldOp::Get { field, instance } => self.get_field(&field, instance).map(Some),
        }
    }

    pub fn put(
        &self,
        dest: &FieldDescriptor,
        instance: Option<&InstanceStorage>,
        source: FieldSource,
    ) -> Result<(), RuntimeError> {
        handle_put(self.layout, dest, instance, &source)
            .inspect_err(|e| debug_log!("put to {:?} failed: {}", dest, e))
    }

    pub fn put_const(
        &self,
        dest: &FieldDescriptor,
        instance: Option<&InstanceStorage>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.put(dest, instance, FieldSource::Const(value))
    }

    /// Copies `src` into `dest` bit for bit. A static `src` ignores `src_instance`.
    pub fn put_field(
        &self,
        dest: &FieldDescriptor,
        dest_instance: Option<&InstanceStorage>,
        src: &FieldDescriptor,
        src_instance: Option<&InstanceStorage>,
    ) -> Result<(), RuntimeError> {
        let source = if src.is_static() {
            FieldSource::StaticField(*src)
        } else {
            match src_instance {
                Some(instance) => FieldSource::InstanceField {
                    field: *src,
                    instance,
                },
                None => {
                    return Err(RuntimeError::MissingInstance {
                        class_id: src.owning_class,
                        name: src.name,
                    });
                }
            }
        };
        self.put(dest, dest_instance, source)
    }

    pub fn put_local(
        &self,
        dest: &FieldDescriptor,
        instance: Option<&InstanceStorage>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.put(dest, instance, FieldSource::Local(value))
    }

    pub fn get_field(
        &self,
        field: &FieldDescriptor,
        instance: Option<&InstanceStorage>,
    ) -> Result<Value, RuntimeError> {
        handle_getfield(self.layout, field, instance)
            .inspect_err(|e| debug_log!("get of {:?} failed: {}", field, e))
    }
}

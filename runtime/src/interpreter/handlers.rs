use crate::error::RuntimeError;
use crate::heap::{ClassStaticStorage, InstanceStorage, ObjectLayoutManager, Region};
use crate::interpreter::FieldSource;
use crate::rt::field::{FieldDescriptor, FieldScope};
use crate::vm::Value;
use std::sync::Arc;

/// Region a descriptor points into: borrowed for instance fields, shared for static ones.
pub(super) enum Target<'a> {
    Instance(&'a Region),
    Static(Arc<ClassStaticStorage>),
}

impl Target<'_> {
    fn region(&self) -> &Region {
        match self {
            Target::Instance(region) => *region,
            Target::Static(storage) => storage.region(),
        }
    }
}

fn check_instance(
    layout: &ObjectLayoutManager,
    field: &FieldDescriptor,
    instance: &InstanceStorage,
) -> Result<(), RuntimeError> {
    if instance.class_id() == field.owning_class
        || layout
            .registry()
            .is_subclass_of(instance.class_id(), field.owning_class)?
    {
        Ok(())
    } else {
        Err(RuntimeError::IncompatibleInstance {
            expected: field.owning_class,
            actual: instance.class_id(),
        })
    }
}

/// Static fields ignore `instance`; instance fields require one of a compatible class.
pub(super) fn target_region<'a>(
    layout: &ObjectLayoutManager,
    field: &FieldDescriptor,
    instance: Option<&'a InstanceStorage>,
) -> Result<Target<'a>, RuntimeError> {
    match field.scope {
        FieldScope::Static => Ok(Target::Static(
            layout.get_static_storage(field.owning_class)?,
        )),
        FieldScope::Instance => {
            let instance = instance.ok_or(RuntimeError::MissingInstance {
                class_id: field.owning_class,
                name: field.name,
            })?;
            check_instance(layout, field, instance)?;
            Ok(Target::Instance(instance.region()))
        }
    }
}

#[hotpath::measure]
pub(super) fn handle_getfield(
    layout: &ObjectLayoutManager,
    field: &FieldDescriptor,
    instance: Option<&InstanceStorage>,
) -> Result<Value, RuntimeError> {
    let target = target_region(layout, field, instance)?;
    layout.read_value(target.region(), field.offset, field.width)
}

fn load_source(layout: &ObjectLayoutManager, source: &FieldSource) -> Result<Value, RuntimeError> {
    match source {
        FieldSource::Const(value) | FieldSource::Local(value) => Ok(*value),
        FieldSource::InstanceField { field, instance } => {
            handle_getfield(layout, field, Some(*instance))
        }
        FieldSource::StaticField(field) => handle_getfield(layout, field, None),
    }
}

#[hotpath::measure]
pub(super) fn handle_put(
    layout: &ObjectLayoutManager,
    dest: &FieldDescriptor,
    instance: Option<&InstanceStorage>,
    source: &FieldSource,
) -> Result<(), RuntimeError> {
    if source.width() != dest.width {
        return Err(RuntimeError::WidthMismatch {
            expected: dest.width,
            actual: source.width(),
        });
    }
    // destination is validated before the source is read
    let target = target_region(layout, dest, instance)?;
    let value = load_source(layout, source)?;
    layout.write_value(target.region(), dest.offset, value)
}

use crate::error::RuntimeError;
use crate::keys::{ClassId, FieldKey};
use crate::rt::field::{FieldDescriptor, FieldScope, FieldSpec};
use itertools::Itertools;
use lasso::ThreadedRodeo;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Layout of one class: where each declared field lives in the instance and static regions.
/// Computed once at registration and never mutated afterwards.
#[derive(Debug)]
pub struct ClassLayout {
    id: ClassId,
    super_id: Option<ClassId>,
    fields: SmallVec<[FieldDescriptor; 8]>,
    field_index: HashMap<FieldKey, usize>,
    instance_size: usize,
    static_size: usize,
}

const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

impl ClassLayout {
    /// Assigns offsets in declaration order. Instance fields continue after the super class's
    /// instance fields; static fields always start at 0 in the class's own region.
    pub fn compute(
        id: ClassId,
        super_layout: Option<&ClassLayout>,
        specs: &[FieldSpec],
    ) -> Result<Self, RuntimeError> {
        let mut instance_offset = super_layout.map_or(0, |s| s.instance_size);
        let mut static_offset = 0;
        let mut fields = SmallVec::with_capacity(specs.len());
        let mut field_index = HashMap::with_capacity(specs.len());

        for spec in specs {
            if field_index.contains_key(&spec.key()) {
                return Err(RuntimeError::DuplicateField {
                    class_id: id,
                    name: spec.name,
                    scope: spec.scope,
                });
            }

            let cursor = match spec.scope {
                FieldScope::Instance => &mut instance_offset,
                FieldScope::Static => &mut static_offset,
            };
            let offset = align_up(*cursor, spec.width.alignment());
            *cursor = offset + spec.width.byte_size();

            field_index.insert(spec.key(), fields.len());
            fields.push(FieldDescriptor {
                owning_class: id,
                name: spec.name,
                width: spec.width,
                scope: spec.scope,
                offset,
            });
        }

        Ok(Self {
            id,
            super_id: super_layout.map(|s| s.id),
            fields,
            field_index,
            instance_size: instance_offset,
            static_size: static_offset,
        })
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn super_id(&self) -> Option<ClassId> {
        self.super_id
    }

    /// Bytes needed by one instance, inherited fields included.
    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    pub fn static_size(&self) -> usize {
        self.static_size
    }

    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get_declared_field(&self, key: &FieldKey) -> Option<&FieldDescriptor> {
        self.field_index.get(key).map(|&idx| &self.fields[idx])
    }

    pub fn render(&self, interner: &ThreadedRodeo) -> String {
        let render_scope = |scope: FieldScope| {
            self.fields
                .iter()
                .filter(|f| f.scope == scope)
                .map(|f| format!("{}@{}:{}", interner.resolve(&f.name), f.offset, f.width))
                .join(", ")
        };
        format!(
            "{} instance({}) [{}] static({}) [{}]",
            self.id,
            self.instance_size,
            render_scope(FieldScope::Instance),
            self.static_size,
            render_scope(FieldScope::Static),
        )
    }
}

use crate::debug_log;
use crate::error::RuntimeError;
use crate::keys::{ClassId, FieldKey, Symbol};
use crate::rt::class::ClassLayout;
use crate::rt::field::{FieldDescriptor, FieldScope, FieldSpec};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lasso::ThreadedRodeo;
use std::sync::Arc;

/// Maps `(class, field name)` to a [`FieldDescriptor`]. A class is published once, fully laid
/// out, and is read-only from then on.
pub struct FieldRegistry {
    interner: Arc<ThreadedRodeo>,
    classes: DashMap<ClassId, Arc<ClassLayout>>,
}

impl FieldRegistry {
    pub fn new(interner: Arc<ThreadedRodeo>) -> Self {
        Self {
            interner,
            classes: DashMap::new(),
        }
    }

    pub fn interner(&self) -> &ThreadedRodeo {
        &self.interner
    }

    pub fn register_class(
        &self,
        class_id: ClassId,
        super_id: Option<ClassId>,
        specs: &[FieldSpec],
    ) -> Result<Arc<ClassLayout>, RuntimeError> {
        if self.classes.contains_key(&class_id) {
            return Err(RuntimeError::ClassAlreadyRegistered(class_id));
        }
        // super layout is cloned out first, the entry below locks a shard
        let super_layout = super_id.map(|id| self.get_layout(&id)).transpose()?;
        let layout = Arc::new(ClassLayout::compute(
            class_id,
            super_layout.as_deref(),
            specs,
        )?);

        match self.classes.entry(class_id) {
            Entry::Occupied(_) => Err(RuntimeError::ClassAlreadyRegistered(class_id)),
            Entry::Vacant(slot) => {
                debug_log!("Registered class {}", layout.render(&self.interner));
                slot.insert(layout.clone());
                Ok(layout)
            }
        }
    }

    pub fn get_layout(&self, class_id: &ClassId) -> Result<Arc<ClassLayout>, RuntimeError> {
        self.classes
            .get(class_id)
            .map(|entry| entry.value().clone())
            .ok_or(RuntimeError::UnknownClass(*class_id))
    }

    pub fn is_registered(&self, class_id: &ClassId) -> bool {
        self.classes.contains_key(class_id)
    }

    /// Looks the name up in the class and then its super chain. Within one class an instance
    /// declaration wins over a static one with the same name.
    pub fn resolve(&self, class_id: ClassId, name: Symbol) -> Result<FieldDescriptor, RuntimeError> {
        self.find_in_chain(class_id, name, &[FieldScope::Instance, FieldScope::Static])
    }

    pub fn resolve_scoped(
        &self,
        class_id: ClassId,
        name: Symbol,
        scope: FieldScope,
    ) -> Result<FieldDescriptor, RuntimeError> {
        self.find_in_chain(class_id, name, &[scope])
    }

    /// Like [`Self::resolve`], but never interns `name`: a name the interner has not seen
    /// cannot be declared anywhere.
    pub fn resolve_by_name(
        &self,
        class_id: ClassId,
        name: &str,
    ) -> Result<FieldDescriptor, RuntimeError> {
        self.find_by_name(class_id, name, &[FieldScope::Instance, FieldScope::Static])
    }

    pub fn resolve_scoped_by_name(
        &self,
        class_id: ClassId,
        name: &str,
        scope: FieldScope,
    ) -> Result<FieldDescriptor, RuntimeError> {
        self.find_by_name(class_id, name, &[scope])
    }

    fn find_by_name(
        &self,
        class_id: ClassId,
        name: &str,
        scopes: &[FieldScope],
    ) -> Result<FieldDescriptor, RuntimeError> {
        match self.interner.get(name) {
            Some(sym) => self.find_in_chain(class_id, sym, scopes),
            None => {
                self.get_layout(&class_id)?;
                Err(RuntimeError::UnknownField {
                    class_id,
                    name: name.to_string(),
                })
            }
        }
    }

    fn find_in_chain(
        &self,
        class_id: ClassId,
        name: Symbol,
        scopes: &[FieldScope],
    ) -> Result<FieldDescriptor, RuntimeError> {
        let mut current = Some(class_id);
        while let Some(id) = current {
            let layout = self.get_layout(&id)?;
            for &scope in scopes {
                if let Some(field) = layout.get_declared_field(&FieldKey { name, scope }) {
                    return Ok(*field);
                }
            }
            current = layout.super_id();
        }
        Err(RuntimeError::UnknownField {
            class_id,
            name: self.interner.resolve(&name).to_string(),
        })
    }

    /// True when `class_id` is `target` or inherits from it.
    pub fn is_subclass_of(&self, class_id: ClassId, target: ClassId) -> Result<bool, RuntimeError> {
        let mut current = Some(class_id);
        while let Some(id) = current {
            if id == target {
                return Ok(true);
            }
            current = self.get_layout(&id)?.super_id();
        }
        Ok(false)
    }
}

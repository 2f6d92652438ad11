use crate::debug_log;
use crate::error::RuntimeError;
use crate::heap::ObjectLayoutManager;
use crate::keys::{ClassId, Symbol};
use crate::rt::field::{FieldScope, FieldSpec, WidthClass};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    /// Primitive field descriptor, e.g. `I` or `J`.
    pub descriptor: String,
    pub is_static: bool,
}

/// Class shape as delivered by the class-file side: a name, an optional super class name and
/// the fields in declaration order.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub super_name: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: None,
            fields: Vec::new(),
        }
    }

    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            descriptor: descriptor.into(),
            is_static: false,
        });
        self
    }

    pub fn static_field(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            descriptor: descriptor.into(),
            is_static: true,
        });
        self
    }
}

/// Assigns class ids by name and registers classes super-first.
pub struct ClassLoader {
    layout: Arc<ObjectLayoutManager>,
    definitions: Mutex<HashMap<Symbol, ClassDef>>,
    loaded: DashMap<Symbol, ClassId>,
    next_id: AtomicU32,
}

impl ClassLoader {
    pub fn new(layout: Arc<ObjectLayoutManager>) -> Self {
        debug_log!("Creating ClassLoader...");
        Self {
            layout,
            definitions: Mutex::new(HashMap::new()),
            loaded: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    fn intern(&self, name: &str) -> Symbol {
        self.layout.registry().interner().get_or_intern(name)
    }

    /// Makes a definition available for loading. A later definition with the same name
    /// replaces an earlier one that has not been loaded yet.
    pub fn define(&self, def: ClassDef) -> Result<(), RuntimeError> {
        let name = self.intern(&def.name);
        self.definitions.lock()?.insert(name, def);
        Ok(())
    }

    pub fn find_loaded(&self, name: &str) -> Option<ClassId> {
        let sym = self.layout.registry().interner().get(name)?;
        self.loaded.get(&sym).map(|entry| *entry.value())
    }

    pub fn get_class_id_or_load(&self, name: &str) -> Result<ClassId, RuntimeError> {
        let sym = self.intern(name);
        if let Some(id) = self.loaded.get(&sym) {
            return Ok(*id.value());
        }

        // held for the whole load so a class is registered at most once
        let definitions = self.definitions.lock()?;

        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(sym);
        while let Some(cur) = current {
            if self.loaded.contains_key(&cur) {
                break;
            }
            if !seen.insert(cur) {
                return Err(RuntimeError::ClassCircularity(cur));
            }
            let def = definitions
                .get(&cur)
                .ok_or(RuntimeError::ClassNotFound(cur))?;
            chain.push((cur, def));
            current = def.super_name.as_deref().map(|s| self.intern(s));
        }

        for (name, def) in chain.into_iter().rev() {
            self.load_class(name, def)?;
        }
        self.loaded
            .get(&sym)
            .map(|entry| *entry.value())
            .ok_or(RuntimeError::ClassNotFound(sym))
    }

    fn load_class(&self, name: Symbol, def: &ClassDef) -> Result<ClassId, RuntimeError> {
        let super_id = match &def.super_name {
            Some(super_name) => {
                let super_sym = self.intern(super_name);
                Some(
                    self.loaded
                        .get(&super_sym)
                        .map(|entry| *entry.value())
                        .ok_or(RuntimeError::ClassNotFound(super_sym))?,
                )
            }
            None => None,
        };
        let specs = def
            .fields
            .iter()
            .map(|f| {
                Ok(FieldSpec {
                    name: self.intern(&f.name),
                    width: WidthClass::from_descriptor(&f.descriptor)?,
                    scope: if f.is_static {
                        FieldScope::Static
                    } else {
                        FieldScope::Instance
                    },
                })
            })
            .collect::<Result<Vec<_>, RuntimeError>>()?;

        let class_id = self.allocate_class_id()?;
        self.layout
            .registry()
            .register_class(class_id, super_id, &specs)?;
        self.layout.prepare_class(class_id)?;
        self.loaded.insert(name, class_id);
        debug_log!("Loaded class \"{}\" as {}", def.name, class_id);
        Ok(class_id)
    }

    /// Hands out the next id not already taken by a class registered directly. The counter
    /// never wraps: once it reaches `u32::MAX` every later call fails.
    fn allocate_class_id(&self) -> Result<ClassId, RuntimeError> {
        loop {
            let raw = self
                .next_id
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
                .map_err(|_| RuntimeError::ClassIdExhausted)?;
            let class_id = ClassId::from_u32(raw).ok_or(RuntimeError::ClassIdExhausted)?;
            if !self.layout.registry().is_registered(&class_id) {
                return Ok(class_id);
            }
            debug_log!("Class id {} is already registered, skipping", class_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt::registry::FieldRegistry;
    use lasso::ThreadedRodeo;

    fn loader() -> ClassLoader {
        let registry = Arc::new(FieldRegistry::new(Arc::new(ThreadedRodeo::default())));
        ClassLoader::new(Arc::new(ObjectLayoutManager::new(registry)))
    }

    #[test]
    fn loads_super_class_first() {
        let loader = loader();
        loader
            .define(ClassDef::new("Derived").extends("Base").field("w", "J"))
            .unwrap();
        loader
            .define(ClassDef::new("Base").field("x", "I").static_field("z", "I"))
            .unwrap();

        let derived = loader.get_class_id_or_load("Derived").unwrap();
        let base = loader.find_loaded("Base").unwrap();

        assert_eq!(base.as_u32(), 1);
        assert_eq!(derived.as_u32(), 2);
        let registry = loader.layout.registry();
        assert!(registry.is_subclass_of(derived, base).unwrap());
        assert_eq!(registry.resolve_by_name(derived, "w").unwrap().offset, 8);
    }

    #[test]
    fn loading_twice_returns_same_id() {
        let loader = loader();
        loader.define(ClassDef::new("A").field("x", "I")).unwrap();
        let first = loader.get_class_id_or_load("A").unwrap();
        let second = loader.get_class_id_or_load("A").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn undefined_class_is_not_found() {
        let loader = loader();
        loader.define(ClassDef::new("A").extends("Missing")).unwrap();
        let missing = loader.intern("Missing");
        assert_eq!(
            loader.get_class_id_or_load("A").unwrap_err(),
            RuntimeError::ClassNotFound(missing)
        );
        assert!(loader.find_loaded("A").is_none());
    }

    #[test]
    fn circular_super_chain_is_rejected() {
        let loader = loader();
        loader.define(ClassDef::new("A").extends("B")).unwrap();
        loader.define(ClassDef::new("B").extends("A")).unwrap();
        assert!(matches!(
            loader.get_class_id_or_load("A"),
            Err(RuntimeError::ClassCircularity(_))
        ));
    }

    #[test]
    fn class_ids_stay_exhausted() {
        let loader = loader();
        loader.next_id.store(u32::MAX - 1, Ordering::Relaxed);

        assert_eq!(loader.allocate_class_id().unwrap().as_u32(), u32::MAX - 1);
        assert_eq!(loader.allocate_class_id().unwrap_err(), RuntimeError::ClassIdExhausted);
        assert_eq!(loader.allocate_class_id().unwrap_err(), RuntimeError::ClassIdExhausted);
    }

    #[test]
    fn directly_registered_ids_are_skipped() {
        let loader = loader();
        let taken = ClassId::from_u32(1).unwrap();
        loader
            .layout
            .registry()
            .register_class(taken, None, &[])
            .unwrap();

        loader.define(ClassDef::new("A").field("x", "I")).unwrap();
        let loaded = loader.get_class_id_or_load("A").unwrap();

        assert_eq!(loaded.as_u32(), 2);
    }

    #[test]
    fn reference_descriptor_is_unsupported() {
        let loader = loader();
        loader
            .define(ClassDef::new("A").field("o", "Ljava/lang/Object;"))
            .unwrap();
        assert_eq!(
            loader.get_class_id_or_load("A").unwrap_err(),
            RuntimeError::UnsupportedDescriptor("Ljava/lang/Object;".to_string())
        );
    }
}

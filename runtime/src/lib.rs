use crate::class_loader::{ClassDef, ClassLoader};
use crate::error::RuntimeError;
use crate::heap::object_table::ObjectTable;
use crate::heap::{ClassStaticStorage, InstanceStorage, ObjectLayoutManager};
use crate::interpreter::FieldAccess;
use crate::keys::ClassId;
use crate::rt::class::ClassLayout;
use crate::rt::field::{FieldDescriptor, FieldScope, FieldSpec};
use crate::rt::registry::FieldRegistry;
use lasso::ThreadedRodeo;
use std::sync::Arc;

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "log-runtime-traces") {
            ::tracing_log::log::debug!($($arg)*);
        }
    };
}

pub mod class_loader;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod keys;
pub mod rt;
pub mod vm;

pub use keys::Symbol;

/// When a class's static region comes into existence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaticInitPolicy {
    /// On the first static access.
    #[default]
    Lazy,
    /// Right after the class is registered.
    Eager,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub static_init: StaticInitPolicy,
    /// Shared interner; a fresh one is created when absent.
    pub interner: Option<Arc<ThreadedRodeo>>,
}

/// Owns the registry, layout manager, object table and class loader of one runtime. Nothing
/// here is process-global: independent runtimes never see each other's classes or statics.
pub struct Runtime {
    interner: Arc<ThreadedRodeo>,
    layout: Arc<ObjectLayoutManager>,
    objects: ObjectTable,
    class_loader: ClassLoader,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        debug_log!("Creating runtime with {:?}", config.static_init);
        let interner = config
            .interner
            .unwrap_or_else(|| Arc::new(ThreadedRodeo::default()));
        let registry = Arc::new(FieldRegistry::new(interner.clone()));
        let layout = Arc::new(ObjectLayoutManager::with_policy(
            registry,
            config.static_init,
        ));
        Self {
            interner,
            objects: ObjectTable::new(layout.clone()),
            class_loader: ClassLoader::new(layout.clone()),
            layout,
        }
    }

    pub fn interner(&self) -> &ThreadedRodeo {
        &self.interner
    }

    pub fn registry(&self) -> &FieldRegistry {
        self.layout.registry()
    }

    pub fn layout(&self) -> &ObjectLayoutManager {
        &self.layout
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn class_loader(&self) -> &ClassLoader {
        &self.class_loader
    }

    pub fn access(&self) -> FieldAccess<'_> {
        FieldAccess::new(&self.layout)
    }

    pub fn intern(&self, name: &str) -> Symbol {
        self.interner.get_or_intern(name)
    }

    pub fn register_class(
        &self,
        class_id: ClassId,
        super_id: Option<ClassId>,
        specs: &[FieldSpec],
    ) -> Result<Arc<ClassLayout>, RuntimeError> {
        let layout = self.registry().register_class(class_id, super_id, specs)?;
        self.layout.prepare_class(class_id)?;
        Ok(layout)
    }

    pub fn define_and_load(&self, def: ClassDef) -> Result<ClassId, RuntimeError> {
        let name = def.name.clone();
        self.class_loader.define(def)?;
        self.class_loader.get_class_id_or_load(&name)
    }

    pub fn resolve(&self, class_id: ClassId, name: &str) -> Result<FieldDescriptor, RuntimeError> {
        self.registry().resolve_by_name(class_id, name)
    }

    pub fn resolve_scoped(
        &self,
        class_id: ClassId,
        name: &str,
        scope: FieldScope,
    ) -> Result<FieldDescriptor, RuntimeError> {
        self.registry().resolve_scoped_by_name(class_id, name, scope)
    }

    pub fn allocate_instance_storage(
        &self,
        class_id: ClassId,
    ) -> Result<InstanceStorage, RuntimeError> {
        self.layout.allocate_instance_storage(class_id)
    }

    pub fn get_static_storage(
        &self,
        class_id: ClassId,
    ) -> Result<Arc<ClassStaticStorage>, RuntimeError> {
        self.layout.get_static_storage(class_id)
    }

    pub fn pretty_error(&self, err: RuntimeError) -> String {
        err.into_pretty_string(&self.interner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt::field::WidthClass;
    use crate::vm::Value;
    use rstest::rstest;

    fn fixtures(runtime: &Runtime) -> (ClassId, ClassId) {
        let i = runtime
            .define_and_load(
                ClassDef::new("jvm/PutfieldTest$I")
                    .field("x", "I")
                    .field("y", "I")
                    .static_field("z", "I"),
            )
            .unwrap();
        let j = runtime
            .define_and_load(
                ClassDef::new("jvm/PutfieldTest$J")
                    .field("x", "J")
                    .field("y", "J")
                    .static_field("z", "J"),
            )
            .unwrap();
        (i, j)
    }

    #[rstest]
    #[case(StaticInitPolicy::Lazy, false)]
    #[case(StaticInitPolicy::Eager, true)]
    fn static_init_policy_decides_creation_time(
        #[case] static_init: StaticInitPolicy,
        #[case] created_on_load: bool,
    ) {
        let runtime = Runtime::new(RuntimeConfig {
            static_init,
            ..Default::default()
        });
        let (i, _) = fixtures(&runtime);
        assert_eq!(runtime.layout().has_static_storage(&i), created_on_load);

        let z = runtime.resolve(i, "z").unwrap();
        runtime.access().put_const(&z, None, Value::Int(1)).unwrap();
        assert_eq!(runtime.access().get_field(&z, None).unwrap(), Value::Int(1));
        assert!(runtime.layout().has_static_storage(&i));
    }

    #[test]
    fn runtimes_are_isolated() {
        let first = Runtime::new(RuntimeConfig::default());
        let second = Runtime::new(RuntimeConfig::default());
        let (i1, _) = fixtures(&first);
        let (i2, _) = fixtures(&second);
        assert_eq!(i1, i2);

        let z1 = first.resolve(i1, "z").unwrap();
        let z2 = second.resolve(i2, "z").unwrap();
        first.access().put_const(&z1, None, Value::Int(5)).unwrap();

        assert_eq!(second.access().get_field(&z2, None).unwrap(), Value::Int(0));
    }

    #[test]
    fn attached_objects_share_statics_but_not_fields() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let (_, j) = fixtures(&runtime);
        let a = runtime.objects().attach(1, j).unwrap();
        let b = runtime.objects().attach(2, j).unwrap();
        let x = runtime.resolve(j, "x").unwrap();
        let z = runtime.resolve(j, "z").unwrap();
        let access = runtime.access();

        access.put_local(&x, Some(a.as_ref()), Value::Long(-2)).unwrap();
        access.put_const(&z, Some(a.as_ref()), Value::Long(1 << 40)).unwrap();

        assert_eq!(access.get_field(&x, Some(b.as_ref())).unwrap(), Value::Long(0));
        assert_eq!(access.get_field(&z, Some(b.as_ref())).unwrap(), Value::Long(1 << 40));
        let static_region = runtime.get_static_storage(j).unwrap();
        assert_eq!(
            runtime.layout().read_word64(static_region.region(), z.offset).unwrap(),
            1 << 40
        );
    }

    #[test]
    fn register_class_directly_with_explicit_id() {
        let runtime = Runtime::new(RuntimeConfig {
            static_init: StaticInitPolicy::Eager,
            ..Default::default()
        });
        let id = ClassId::from_u32(100).unwrap();
        let count = runtime.intern("count");
        runtime
            .register_class(id, None, &[FieldSpec::class(count, WidthClass::Word64)])
            .unwrap();

        assert!(runtime.layout().has_static_storage(&id));
        let field = runtime
            .resolve_scoped(id, "count", FieldScope::Static)
            .unwrap();
        assert_eq!(field.width, WidthClass::Word64);
        assert!(matches!(
            runtime.resolve_scoped(id, "count", FieldScope::Instance),
            Err(RuntimeError::UnknownField { .. })
        ));
    }

    #[test]
    fn pretty_error_resolves_names() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let (i, _) = fixtures(&runtime);
        let err = runtime.resolve(i, "nope").unwrap_err();
        assert_eq!(runtime.pretty_error(err), "no field \"nope\" in class #1");
        assert!(runtime.interner().get("nope").is_none());
    }

    #[test]
    fn loader_skips_ids_registered_directly() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let taken = ClassId::from_u32(1).unwrap();
        let c = runtime.intern("c");
        runtime
            .register_class(taken, None, &[FieldSpec::class(c, WidthClass::Word32)])
            .unwrap();

        let loaded = runtime
            .define_and_load(ClassDef::new("A").field("x", "I"))
            .unwrap();

        assert_eq!(loaded.as_u32(), 2);
        assert_eq!(runtime.resolve(loaded, "x").unwrap().owning_class, loaded);
        assert_eq!(runtime.resolve(taken, "c").unwrap().owning_class, taken);
    }
}

use crate::StaticInitPolicy;
use crate::debug_log;
use crate::error::RuntimeError;
use crate::keys::ClassId;
use crate::rt::field::WidthClass;
use crate::rt::registry::FieldRegistry;
use crate::vm::Value;
use dashmap::DashMap;
use std::sync::Arc;

pub mod object_table;
pub mod region;

pub use region::Region;

/// Per-object field storage, sized from the class layout (inherited fields included).
#[derive(Debug)]
pub struct InstanceStorage {
    class_id: ClassId,
    region: Region,
}

impl InstanceStorage {
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn region(&self) -> &Region {
        &self.region
    }
}

/// The one static region of a class, shared by all of its instances and all threads.
#[derive(Debug)]
pub struct ClassStaticStorage {
    class_id: ClassId,
    region: Region,
}

impl ClassStaticStorage {
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn region(&self) -> &Region {
        &self.region
    }
}

pub struct ObjectLayoutManager {
    registry: Arc<FieldRegistry>,
    statics: DashMap<ClassId, Arc<ClassStaticStorage>>,
    static_init: StaticInitPolicy,
}

impl ObjectLayoutManager {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self::with_policy(registry, StaticInitPolicy::default())
    }

    pub fn with_policy(registry: Arc<FieldRegistry>, static_init: StaticInitPolicy) -> Self {
        Self {
            registry,
            statics: DashMap::new(),
            static_init,
        }
    }

    /// Called once a class is registered. Under [`StaticInitPolicy::Eager`] the static region
    /// is created here instead of on first access.
    pub fn prepare_class(&self, class_id: ClassId) -> Result<(), RuntimeError> {
        match self.static_init {
            StaticInitPolicy::Eager => self.get_static_storage(class_id).map(|_| ()),
            StaticInitPolicy::Lazy => Ok(()),
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn allocate_instance_storage(
        &self,
        class_id: ClassId,
    ) -> Result<InstanceStorage, RuntimeError> {
        let layout = self.registry.get_layout(&class_id)?;
        Ok(InstanceStorage {
            class_id,
            region: Region::new(layout.instance_size()),
        })
    }

    /// Returns the class's static region, creating it on first call. Concurrent first calls
    /// race on the map entry, so exactly one region is ever published per class.
    pub fn get_static_storage(
        &self,
        class_id: ClassId,
    ) -> Result<Arc<ClassStaticStorage>, RuntimeError> {
        if let Some(existing) = self.statics.get(&class_id) {
            return Ok(existing.value().clone());
        }
        let layout = self.registry.get_layout(&class_id)?;
        let storage = self
            .statics
            .entry(class_id)
            .or_insert_with(|| {
                debug_log!(
                    "Creating static storage of {} bytes for class {}",
                    layout.static_size(),
                    class_id
                );
                Arc::new(ClassStaticStorage {
                    class_id,
                    region: Region::new(layout.static_size()),
                })
            })
            .value()
            .clone();
        Ok(storage)
    }

    pub fn has_static_storage(&self, class_id: &ClassId) -> bool {
        self.statics.contains_key(class_id)
    }

    pub fn read_word32(&self, region: &Region, offset: usize) -> Result<u32, RuntimeError> {
        region.read_word32(offset)
    }

    pub fn write_word32(
        &self,
        region: &Region,
        offset: usize,
        value: u32,
    ) -> Result<(), RuntimeError> {
        region.write_word32(offset, value)
    }

    pub fn read_word64(&self, region: &Region, offset: usize) -> Result<u64, RuntimeError> {
        region.read_word64(offset)
    }

    pub fn write_word64(
        &self,
        region: &Region,
        offset: usize,
        value: u64,
    ) -> Result<(), RuntimeError> {
        region.write_word64(offset, value)
    }

    /// Reads a typed value at `offset`, dispatching on the width once.
    pub fn read_value(
        &self,
        region: &Region,
        offset: usize,
        width: WidthClass,
    ) -> Result<Value, RuntimeError> {
        match width {
            WidthClass::Word32 => Ok(Value::Int(self.read_word32(region, offset)? as i32)),
            WidthClass::Word64 => Ok(Value::Long(self.read_word64(region, offset)? as i64)),
        }
    }

    pub fn write_value(
        &self,
        region: &Region,
        offset: usize,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match value {
            Value::Int(i) => self.write_word32(region, offset, i as u32),
            Value::Long(l) => self.write_word64(region, offset, l as u64),
        }
    }
}

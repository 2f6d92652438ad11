use crate::debug_log;
use crate::error::RuntimeError;
use crate::heap::{InstanceStorage, ObjectLayoutManager};
use crate::keys::{ClassId, ObjectId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Attaches instance storage to object identities owned by the allocator, and drops it again
/// when the allocator reports the object reclaimed.
pub struct ObjectTable {
    layout: Arc<ObjectLayoutManager>,
    objects: DashMap<ObjectId, Arc<InstanceStorage>>,
}

impl ObjectTable {
    pub fn new(layout: Arc<ObjectLayoutManager>) -> Self {
        Self {
            layout,
            objects: DashMap::new(),
        }
    }

    pub fn attach(
        &self,
        object_id: ObjectId,
        class_id: ClassId,
    ) -> Result<Arc<InstanceStorage>, RuntimeError> {
        let storage = Arc::new(self.layout.allocate_instance_storage(class_id)?);
        match self.objects.entry(object_id) {
            Entry::Occupied(_) => Err(RuntimeError::ObjectAlreadyAttached(object_id)),
            Entry::Vacant(slot) => {
                debug_log!("Attached storage of class {} to object {}", class_id, object_id);
                slot.insert(storage.clone());
                Ok(storage)
            }
        }
    }

    pub fn get(&self, object_id: ObjectId) -> Result<Arc<InstanceStorage>, RuntimeError> {
        self.objects
            .get(&object_id)
            .map(|entry| entry.value().clone())
            .ok_or(RuntimeError::UnknownObject(object_id))
    }

    /// Handles still held by callers stay valid until dropped.
    pub fn release(&self, object_id: ObjectId) -> Result<(), RuntimeError> {
        match self.objects.remove(&object_id) {
            Some(_) => {
                debug_log!("Released storage of object {}", object_id);
                Ok(())
            }
            None => Err(RuntimeError::UnknownObject(object_id)),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

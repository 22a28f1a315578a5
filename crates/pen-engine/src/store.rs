//! Workflow object persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use pen_types::ObjectId;

use crate::error::{EngineError, EngineResult};
use crate::object::WorkflowObject;

/// Storage backend for workflow objects.
///
/// `save` must persist the whole object; the engine calls it after
/// every step, so a crash between steps loses at most the step in
/// progress.
pub trait ObjectStore: Send + Sync {
    /// Persist the object, replacing any previous version.
    fn save(&self, object: &WorkflowObject) -> EngineResult<()>;

    /// Load an object by id.
    fn load(&self, id: &ObjectId) -> EngineResult<WorkflowObject>;

    /// All stored objects, in unspecified order.
    fn list_all(&self) -> EngineResult<Vec<WorkflowObject>>;

    /// Objects that are not in a terminal state.
    fn list_in_flight(&self) -> EngineResult<Vec<WorkflowObject>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|o| !o.status.is_terminal())
            .collect())
    }

    /// The object holding the given callback key, if any.
    fn find_by_callback(&self, key: &str) -> EngineResult<Option<WorkflowObject>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|o| o.extra.callback_key.as_deref() == Some(key)))
    }
}

/// Non-persistent store for tests and single-process runs.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, WorkflowObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn save(&self, object: &WorkflowObject) -> EngineResult<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| EngineError::Storage("object store lock poisoned".into()))?;
        objects.insert(object.id, object.clone());
        Ok(())
    }

    fn load(&self, id: &ObjectId) -> EngineResult<WorkflowObject> {
        let objects = self
            .objects
            .read()
            .map_err(|_| EngineError::Storage("object store lock poisoned".into()))?;
        objects.get(id).cloned().ok_or(EngineError::NotFound(*id))
    }

    fn list_all(&self) -> EngineResult<Vec<WorkflowObject>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| EngineError::Storage("object store lock poisoned".into()))?;
        Ok(objects.values().cloned().collect())
    }
}

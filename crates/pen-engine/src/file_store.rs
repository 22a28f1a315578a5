//! Directory-backed object store.
//!
//! Each object lives in `<dir>/<id>.json`. Writes go through a
//! temporary file and a rename, so a crash mid-write leaves either the
//! old version or the new one, never a torn file. Unreadable files are
//! skipped with a warning during listing so one corrupt entry cannot
//! take down recovery.

use std::fs;
use std::path::{Path, PathBuf};

use pen_types::ObjectId;
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::object::WorkflowObject;
use crate::store::ObjectStore;

pub struct FileObjectStore {
    dir: PathBuf,
}

impl FileObjectStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(storage)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &ObjectId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read_object(path: &Path) -> EngineResult<WorkflowObject> {
        let bytes = fs::read(path).map_err(storage)?;
        serde_json::from_slice(&bytes).map_err(storage)
    }
}

fn storage(error: impl std::fmt::Display) -> EngineError {
    EngineError::Storage(error.to_string())
}

impl ObjectStore for FileObjectStore {
    fn save(&self, object: &WorkflowObject) -> EngineResult<()> {
        let bytes = serde_json::to_vec_pretty(object).map_err(storage)?;
        let tmp = self.dir.join(format!("{}.json.tmp", object.id));
        fs::write(&tmp, bytes).map_err(storage)?;
        fs::rename(&tmp, self.path_for(&object.id)).map_err(storage)?;
        Ok(())
    }

    fn load(&self, id: &ObjectId) -> EngineResult<WorkflowObject> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(EngineError::NotFound(*id));
        }
        Self::read_object(&path)
    }

    fn list_all(&self) -> EngineResult<Vec<WorkflowObject>> {
        let mut objects = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(storage)? {
            let entry = entry.map_err(storage)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_object(&path) {
                Ok(object) => objects.push(object),
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable object file");
                }
            }
        }
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ExtraData;
    use pen_types::{Document, ObjectStatus, Source};

    fn test_object() -> WorkflowObject {
        WorkflowObject::new(
            "ingestion",
            Document::new(),
            ExtraData::new(Source::new("elsevier").unwrap()),
        )
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut obj = test_object();
        obj.status = ObjectStatus::Halted;
        {
            let store = FileObjectStore::open(dir.path()).unwrap();
            store.save(&obj).unwrap();
        }
        let store = FileObjectStore::open(dir.path()).unwrap();
        let loaded = store.load(&obj.id).unwrap();
        assert_eq!(loaded.status, ObjectStatus::Halted);
        assert_eq!(loaded.pipeline, "ingestion");
    }

    #[test]
    fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load(&ObjectId::new()),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn listing_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();
        store.save(&test_object()).unwrap();
        fs::write(dir.path().join("garbage.json"), b"not json").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let objects = store.list_all().unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn save_replaces_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();
        let mut obj = test_object();
        store.save(&obj).unwrap();
        obj.status = ObjectStatus::Completed;
        store.save(&obj).unwrap();
        assert_eq!(store.load(&obj.id).unwrap().status, ObjectStatus::Completed);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}

//! メモリ上の ObjectStore 実装（テスト・デモ用）

use crate::error::Error;
use crate::ports::outbound::{ObjectMeta, ObjectStore, Precondition, StoredObject};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// name -> (bytes, generation) を BTreeMap で保持する ObjectStore
pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, (Vec<u8>, i64)>>,
    next_generation: Mutex<i64>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
            next_generation: Mutex::new(1),
        }
    }

    /// 初期データを入れる（前提条件なし）
    pub fn with_object(self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        let _ = self.put(name, contents.as_ref(), "application/octet-stream", Precondition::None);
        self
    }

    fn bump_generation(&self) -> Result<i64, Error> {
        let mut g = self
            .next_generation
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))?;
        let current = *g;
        *g += 1;
        Ok(current)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, Error> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))?;
        Ok(objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, (bytes, generation))| ObjectMeta {
                name: name.clone(),
                size: bytes.len() as u64,
                generation: *generation,
            })
            .collect())
    }

    fn get(&self, name: &str) -> Result<StoredObject, Error> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))?;
        let (bytes, generation) = objects
            .get(name)
            .ok_or_else(|| Error::storage(format!("object not found: {}", name)))?;
        Ok(StoredObject {
            name: name.to_string(),
            bytes: bytes.clone(),
            generation: *generation,
        })
    }

    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        _content_type: &str,
        precondition: Precondition,
    ) -> Result<i64, Error> {
        let generation = self.bump_generation()?;
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned"))?;
        let current = objects.get(name).map(|(_, g)| *g);
        match (precondition, current) {
            (Precondition::DoesNotExist, Some(_)) => {
                return Err(Error::conflict(format!("{} already exists", name)));
            }
            (Precondition::GenerationMatch(expected), Some(actual)) if expected != actual => {
                return Err(Error::conflict(format!(
                    "{} changed (expected generation {}, found {})",
                    name, expected, actual
                )));
            }
            (Precondition::GenerationMatch(_), None) => {
                return Err(Error::conflict(format!("{} was deleted", name)));
            }
            _ => {}
        }
        objects.insert(name.to_string(), (bytes.to_vec(), generation));
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_list() {
        let store = MemoryObjectStore::new("bucket")
            .with_object("news/a.txt", "a")
            .with_object("news/b.txt", "b")
            .with_object("person1234/updates.csv", "x");
        let news = store.list("news/").unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].name, "news/a.txt");
        assert_eq!(store.get("news/b.txt").unwrap().text(), "b");
        assert_eq!(store.uri("news/a.txt"), "gs://bucket/news/a.txt");
    }

    #[test]
    fn test_generation_precondition() {
        let store = MemoryObjectStore::new("bucket").with_object("u.csv", "v1");
        let read = store.get("u.csv").unwrap();
        store
            .put("u.csv", b"v2", "text/csv", Precondition::GenerationMatch(read.generation))
            .unwrap();
        // 古い世代での書き込みは衝突
        let r = store.put("u.csv", b"v3", "text/csv", Precondition::GenerationMatch(read.generation));
        assert!(matches!(r, Err(Error::Conflict(_))));
        assert_eq!(store.get("u.csv").unwrap().text(), "v2");
    }

    #[test]
    fn test_does_not_exist_precondition() {
        let store = MemoryObjectStore::new("bucket");
        assert!(store.put("a", b"1", "text/plain", Precondition::DoesNotExist).is_ok());
        let r = store.put("a", b"2", "text/plain", Precondition::DoesNotExist);
        assert!(matches!(r, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_get_missing_is_storage_error() {
        let store = MemoryObjectStore::new("bucket");
        assert!(matches!(store.get("nope"), Err(Error::ExternalService { .. })));
    }
}

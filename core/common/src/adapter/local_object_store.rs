//! ローカルディレクトリを ObjectStore として扱う実装（開発用）
//!
//! オブジェクト名の `/` はサブディレクトリになる。世代番号は内容のハッシュで、更新時刻の粒度に左右されない。
//! 書き込みは一時ファイル経由の rename。条件の確認から rename まではプロセス内で直列化する。

use crate::error::Error;
use crate::ports::outbound::{ObjectMeta, ObjectStore, Precondition, StoredObject};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

const TMP_SUFFIX: &str = ".tmp-upload";

pub struct LocalObjectStore {
    root: PathBuf,
    bucket: String,
    write_lock: Mutex<()>,
}

/// 内容から世代番号を作る
fn content_generation(bytes: &[u8]) -> i64 {
    let mut h = DefaultHasher::new();
    bytes.hash(&mut h);
    h.finish() as i64
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// オブジェクト名をルート配下のパスに変換する（`..` や絶対パスは拒否）
    fn path_for(&self, name: &str) -> Result<PathBuf, Error> {
        let rel = Path::new(name);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || name.is_empty() {
            return Err(Error::invalid_data(format!("invalid object name: {}", name)));
        }
        Ok(self.root.join(rel))
    }

    fn generation_of(path: &Path) -> Result<i64, Error> {
        let bytes = fs::read(path)
            .map_err(|e| Error::storage(format!("{}: {}", path.display(), e)))?;
        Ok(content_generation(&bytes))
    }

    fn walk(&self, dir: &Path, out: &mut Vec<ObjectMeta>) -> Result<(), Error> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::storage(format!("{}: {}", dir.display(), e))),
        };
        for entry in entries {
            let path = entry
                .map_err(|e| Error::storage(e.to_string()))?
                .path();
            if path.is_dir() {
                self.walk(&path, out)?;
                continue;
            }
            if path.to_string_lossy().ends_with(TMP_SUFFIX) {
                continue;
            }
            let rel = path
                .strip_prefix(&self.root)
                .map_err(|e| Error::storage(e.to_string()))?;
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            out.push(ObjectMeta {
                name,
                size,
                generation: Self::generation_of(&path)?,
            });
        }
        Ok(())
    }
}

impl ObjectStore for LocalObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, Error> {
        let mut all = Vec::new();
        self.walk(&self.root, &mut all)?;
        let mut matched: Vec<ObjectMeta> = all
            .into_iter()
            .filter(|m| m.name.starts_with(prefix))
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    fn get(&self, name: &str) -> Result<StoredObject, Error> {
        let path = self.path_for(name)?;
        let bytes = fs::read(&path)
            .map_err(|e| Error::storage(format!("{}: {}", name, e)))?;
        Ok(StoredObject {
            name: name.to_string(),
            generation: content_generation(&bytes),
            bytes,
        })
    }

    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        _content_type: &str,
        precondition: Precondition,
    ) -> Result<i64, Error> {
        let path = self.path_for(name)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::storage("local store lock poisoned"))?;
        let exists = path.exists();
        match precondition {
            Precondition::DoesNotExist if exists => {
                return Err(Error::conflict(format!("{} already exists", name)));
            }
            Precondition::GenerationMatch(_) if !exists => {
                return Err(Error::conflict(format!("{} was deleted", name)));
            }
            Precondition::GenerationMatch(expected) => {
                let actual = Self::generation_of(&path)?;
                if actual != expected {
                    return Err(Error::conflict(format!(
                        "{} changed (expected generation {}, found {})",
                        name, expected, actual
                    )));
                }
            }
            _ => {}
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::storage(e.to_string()))?;
        }
        // 書き込みごとに別の一時ファイル（x.png と x.jpg も衝突しない）
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{}.{}{}", file_name, Uuid::new_v4(), TMP_SUFFIX));
        fs::write(&tmp, bytes).map_err(|e| Error::storage(format!("{}: {}", name, e)))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::storage(format!("{}: {}", name, e)));
        }
        Ok(content_generation(bytes))
    }
}

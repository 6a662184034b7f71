//! Per-user directory of one-file-per-item JSON documents.
//!
//! # Layout
//! ```text
//! <data_dir>/
//!     <username>/
//!         1.json
//!         2.json
//!         ...
//! ```
//!
//! The directory listing is the only index. Files are written to
//! `<id>.json.tmp` and renamed into place so a reader never sees a torn item.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::model::Funko;
use crate::observability::metrics;
use crate::store::error::{Result, StoreError};

const ITEM_EXTENSION: &str = "json";
const MAX_COMPONENT_LEN: usize = 64;

/// Whether `name` can be used verbatim as a single path component.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_COMPONENT_LEN
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Handle on one user's storage directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDir {
    path: PathBuf,
}

impl UserDir {
    /// Resolve the directory for `username` under `data_dir`.
    pub fn new(data_dir: &Path, username: &str) -> Result<Self> {
        if !is_safe_component(username) {
            return Err(StoreError::InvalidUsername(username.to_string()));
        }
        Ok(Self {
            path: data_dir.join(username),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the file backing item `id`.
    pub fn item_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{id}.{ITEM_EXTENSION}"))
    }

    /// Make sure the directory exists. Returns `true` if it had to be created.
    pub async fn ensure(&self) -> Result<bool> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => Ok(false),
            Ok(_) => Err(StoreError::io(
                &self.path,
                std::io::Error::new(ErrorKind::AlreadyExists, "path exists and is not a directory"),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&self.path).await.map_err(|e| {
                    tracing::error!(path = ?self.path, error = %e, "Failed to create user directory");
                    StoreError::io(&self.path, e)
                })?;
                tracing::debug!(path = ?self.path, "Created user directory");
                Ok(true)
            }
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Write one item, replacing any previous version.
    pub async fn write(&self, funko: &Funko) -> Result<()> {
        if !is_safe_component(&funko.id) {
            return Err(StoreError::InvalidId(funko.id.clone()));
        }

        let json = serde_json::to_string_pretty(funko).map_err(|source| StoreError::Encode {
            id: funko.id.clone(),
            source,
        })?;

        let target = self.item_path(&funko.id);
        let tmp = self.path.join(format!("{}.{ITEM_EXTENSION}.tmp", funko.id));

        fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &target)
            .await
            .map_err(|e| StoreError::io(&target, e))?;

        tracing::trace!(path = ?target, "Funko written");
        Ok(())
    }

    /// Delete the file for item `id`.
    ///
    /// A file that is already gone counts as deleted. Returns whether a file
    /// was actually removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.item_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "Funko file already absent");
                Ok(false)
            }
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Read every item file in the directory.
    ///
    /// Files that cannot be read or parsed are logged and skipped. Items whose
    /// file carries no id take the file stem; items whose id disagrees with
    /// the file stem are skipped. Results are ordered by id.
    pub async fn read_all(&self) -> Result<Vec<Funko>> {
        let mut entries = fs::read_dir(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        let mut funkos = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.path, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ITEM_EXTENSION) {
                continue;
            }
            if let Some(funko) = read_item(&path).await {
                funkos.push(funko);
            }
        }

        funkos.sort_by(|a, b| {
            a.numeric_id()
                .cmp(&b.numeric_id())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(funkos)
    }
}

async fn read_item(path: &Path) -> Option<Funko> {
    let data = match fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Error reading Funko file");
            metrics::record_storage_error("read");
            return None;
        }
    };

    let mut funko: Funko = match serde_json::from_str(&data) {
        Ok(funko) => funko,
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Error parsing Funko file");
            metrics::record_storage_error("parse");
            return None;
        }
    };

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if funko.id.is_empty() {
        funko.id = stem.to_string();
    }
    // The file name is what remove and persist address.
    if funko.id != stem {
        tracing::warn!(path = ?path, funko_id = %funko.id, "Skipping Funko stored under another id");
        metrics::record_storage_error("parse");
        return None;
    }
    if !is_safe_component(&funko.id) {
        tracing::warn!(path = ?path, funko_id = %funko.id, "Skipping Funko with unusable id");
        return None;
    }
    Some(funko)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::funko::sample;
    use tempfile::tempdir;

    fn with_id(id: &str) -> Funko {
        let mut funko = sample("Groot");
        funko.id = id.to_string();
        funko
    }

    #[test]
    fn username_rules() {
        assert!(is_safe_component("alice"));
        assert!(is_safe_component("bob_2.backup-x"));
        assert!(!is_safe_component(""));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("a/b"));
        assert!(!is_safe_component("a\\b"));
        assert!(!is_safe_component(&"x".repeat(65)));

        let root = Path::new("data");
        assert!(matches!(
            UserDir::new(root, "../etc"),
            Err(StoreError::InvalidUsername(_))
        ));
        assert_eq!(
            UserDir::new(root, "alice").unwrap().item_path("3"),
            Path::new("data/alice/3.json")
        );
    }

    #[tokio::test]
    async fn ensure_creates_once() {
        let tmp = tempdir().unwrap();
        let dir = UserDir::new(&tmp.path().join("nested"), "alice").unwrap();

        assert!(dir.ensure().await.unwrap());
        assert!(!dir.ensure().await.unwrap());
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn write_leaves_no_temp_file() {
        let tmp = tempdir().unwrap();
        let dir = UserDir::new(tmp.path(), "alice").unwrap();
        dir.ensure().await.unwrap();

        dir.write(&with_id("1")).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["1.json".to_string()]);

        let text = std::fs::read_to_string(dir.item_path("1")).unwrap();
        assert!(text.contains("\n  \"name\": \"Groot\""), "expected pretty JSON: {text}");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tmp = tempdir().unwrap();
        let dir = UserDir::new(tmp.path(), "alice").unwrap();
        dir.ensure().await.unwrap();
        dir.write(&with_id("1")).await.unwrap();

        assert!(dir.delete("1").await.unwrap());
        assert!(!dir.delete("1").await.unwrap());
    }

    #[tokio::test]
    async fn read_all_skips_bad_files() {
        let tmp = tempdir().unwrap();
        let dir = UserDir::new(tmp.path(), "alice").unwrap();
        dir.ensure().await.unwrap();

        dir.write(&with_id("10")).await.unwrap();
        dir.write(&with_id("2")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("5.json.tmp"), "{}").unwrap();

        let ids: Vec<_> = dir
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["2".to_string(), "10".to_string()]);
    }

    #[tokio::test]
    async fn missing_id_falls_back_to_file_stem() {
        let tmp = tempdir().unwrap();
        let dir = UserDir::new(tmp.path(), "alice").unwrap();
        dir.ensure().await.unwrap();

        let mut value = serde_json::to_value(with_id("")).unwrap();
        value.as_object_mut().unwrap().remove("id");
        std::fs::write(dir.item_path("7"), value.to_string()).unwrap();

        let funkos = dir.read_all().await.unwrap();
        assert_eq!(funkos.len(), 1);
        assert_eq!(funkos[0].id, "7");
    }

    #[tokio::test]
    async fn item_stored_under_another_id_is_skipped() {
        let tmp = tempdir().unwrap();
        let dir = UserDir::new(tmp.path(), "alice").unwrap();
        dir.ensure().await.unwrap();

        dir.write(&with_id("1")).await.unwrap();
        let stray = serde_json::to_string(&with_id("7")).unwrap();
        std::fs::write(dir.item_path("5"), stray).unwrap();

        let ids: Vec<_> = dir
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["1".to_string()]);
    }
}

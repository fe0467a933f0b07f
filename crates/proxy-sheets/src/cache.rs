//! Card image cache
//!
//! A [`CacheKey`] is derived purely from a card's name, set code, collector
//! number and face. The key doubles as the on-disk filename, so it has to be
//! stable across runs: the filesystem store treats "file exists" as "cached".

use crate::constants::MAX_SAFE_NAME_LEN;
use crate::types::{Card, Face, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Deterministic cache key, `<safe-name>_<set>_<number>[_back].png`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(name: &str, set_code: &str, collector_number: &str, face: Face) -> Self {
        let suffix = if face.is_back() { "_back" } else { "" };
        Self(format!(
            "{}_{}_{}{}.png",
            normalize_name(name),
            sanitize_component(set_code),
            sanitize_component(collector_number),
            suffix
        ))
    }

    pub fn for_card(card: &Card, face: Face) -> Self {
        Self::new(&card.name, &card.set_code, &card.collector_number, face)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-case a card name into a filename-safe form.
///
/// `" // "` (the multi-face separator) and spaces become `_`, commas and
/// double quotes are dropped, and anything else unsafe in a filename is
/// replaced with `_`. The result is truncated to [`MAX_SAFE_NAME_LEN`] chars.
pub fn normalize_name(name: &str) -> String {
    name.replace(" // ", "_")
        .replace([',', '"'], "")
        .to_lowercase()
        .chars()
        .map(|ch| if is_unsafe(ch) { '_' } else { ch })
        .take(MAX_SAFE_NAME_LEN)
        .collect()
}

fn sanitize_component(component: &str) -> String {
    component
        .chars()
        .map(|ch| if is_unsafe(ch) { '_' } else { ch })
        .collect()
}

fn is_unsafe(ch: char) -> bool {
    ch.is_whitespace()
        || ch.is_control()
        || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|')
}

/// Storage backing the image cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn exists(&self, key: &CacheKey) -> bool;

    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;

    /// Store a whole image under `key`, replacing any previous entry
    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<()>;

    async fn remove(&self, key: &CacheKey) -> Result<()>;
}

/// Cache directory on disk, one file per key
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    /// Open (and create if needed) a cache directory
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn exists(&self, key: &CacheKey) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        // Write beside the target and rename so readers never see a partial image
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.part", key.as_str()));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store, used by tests and previews
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, key: CacheKey, bytes: Vec<u8>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, bytes);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn exists(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        self.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_front_and_back() {
        let card = Card::new("Delver of Secrets // Insectile Aberration", "isd", "51");
        assert_eq!(
            CacheKey::for_card(&card, Face::Front).as_str(),
            "delver_of_secrets_insectile_aberration_isd_51.png"
        );
        assert_eq!(
            CacheKey::for_card(&card, Face::Back).as_str(),
            "delver_of_secrets_insectile_aberration_isd_51_back.png"
        );
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(
            normalize_name("Jace, the \"Mind\" Sculptor"),
            "jace_the_mind_sculptor"
        );
        assert_eq!(normalize_name("Fire/Ice"), "fire_ice");
    }

    #[test]
    fn test_normalize_truncates_long_names() {
        let long = "a".repeat(250);
        assert_eq!(normalize_name(&long).chars().count(), MAX_SAFE_NAME_LEN);
    }

    #[test]
    fn test_key_ignores_identifier_and_language() {
        let a = Card::new("Forest", "m21", "274").with_identifier("id-1");
        let mut b = Card::new("Forest", "m21", "274").with_identifier("id-2");
        b.language = "de".to_string();
        assert_eq!(
            CacheKey::for_card(&a, Face::Front),
            CacheKey::for_card(&b, Face::Front)
        );
    }

    #[tokio::test]
    async fn test_fs_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::open(dir.path().join("images")).await.unwrap();
        let key = CacheKey::new("Forest", "m21", "274", Face::Front);

        assert!(!store.exists(&key).await);
        assert_eq!(store.get(&key).await.unwrap(), None);

        store.put(&key, b"png-bytes").await.unwrap();
        assert!(store.exists(&key).await);
        assert!(store.path_for(&key).is_file());
        assert_eq!(store.get(&key).await.unwrap(), Some(b"png-bytes".to_vec()));

        store.remove(&key).await.unwrap();
        assert!(!store.exists(&key).await);
        // Removing a missing entry is not an error
        store.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCacheStore::new();
        let key = CacheKey::new("Island", "m21", "265", Face::Back);
        assert!(store.is_empty());
        store.put(&key, b"x").await.unwrap();
        assert!(store.exists(&key).await);
        assert_eq!(store.len(), 1);
    }
}

//! 论文缓存 - 基础设施层
//!
//! 每篇论文一个 JSON 文件（`<cache_dir>/<paper_id>.json`），跨进程持久化，
//! 只暴露"读 / 写 / 合并单个字段"的能力

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppResult, CacheError};

/// 可缓存的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedField {
    Content,
    Analysis,
    Score,
}

impl CachedField {
    pub fn as_str(self) -> &'static str {
        match self {
            CachedField::Content => "content",
            CachedField::Analysis => "analysis",
            CachedField::Score => "score",
        }
    }
}

/// 缓存条目
///
/// 以原始 JSON 对象保存，各字段独立读取：类型不符的字段视为未缓存，
/// 不影响其他字段；未知字段原样保留，重写时不会丢失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheEntry(Map<String, JsonValue>);

impl CacheEntry {
    /// 读取字段，缺失或不是字符串时返回 `None`
    pub fn get(&self, field: CachedField) -> Option<&str> {
        self.0.get(field.as_str()).and_then(JsonValue::as_str)
    }

    pub fn set(&mut self, field: CachedField, value: String) {
        self.0
            .insert(field.as_str().to_string(), JsonValue::String(value));
    }

    /// 读取任意键的原始值
    pub fn raw(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn insert_raw(&mut self, key: impl Into<String>, value: JsonValue) {
        self.0.insert(key.into(), value);
    }
}

/// 论文缓存
///
/// 职责：
/// - 按论文 ID 读写缓存条目
/// - 损坏或不可读的条目视为未命中
/// - 单字段写入采用"读 → 改 → 写"，同一 ID 串行化，不丢失兄弟字段
/// - 不做过期与淘汰
pub struct PaperCache {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PaperCache {
    /// 打开缓存目录，不存在时创建
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| CacheError::DirectoryCreateFailed {
                path: dir.display().to_string(),
                source,
            })?;
        debug!("缓存目录: {}", dir.display());
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// 条目文件路径
    pub fn entry_path(&self, paper_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", paper_id))
    }

    /// 读取缓存条目
    ///
    /// 文件不存在、不可读、不是合法 JSON 或不是 JSON 对象时返回 `None`
    pub async fn load(&self, paper_id: &str) -> Option<CacheEntry> {
        let path = self.entry_path(paper_id);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("⚠️ 缓存不可读，按未命中处理 ({}): {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️ 缓存已损坏，按未命中处理 ({}): {}", path.display(), e);
                None
            }
        }
    }

    /// 持久化完整条目，替换该 ID 之前的值
    ///
    /// 先写临时文件再重命名，避免中途失败留下半个文件
    pub async fn save(&self, paper_id: &str, entry: &CacheEntry) -> AppResult<()> {
        let path = self.entry_path(paper_id);
        let body = serde_json::to_string_pretty(entry).map_err(|source| {
            CacheError::SerializeFailed {
                paper_id: paper_id.to_string(),
                source,
            }
        })?;

        let tmp_path = self.dir.join(format!(".{}.json.tmp", paper_id));
        let write_failed = |source| CacheError::WriteFailed {
            path: path.display().to_string(),
            source,
        };
        fs::write(&tmp_path, body).await.map_err(write_failed)?;
        fs::rename(&tmp_path, &path).await.map_err(write_failed)?;
        Ok(())
    }

    /// 合并写入单个字段
    ///
    /// 读取现有条目（或空条目），设置字段，写回完整条目
    pub async fn store_field(
        &self,
        paper_id: &str,
        field: CachedField,
        value: impl Into<String>,
    ) -> AppResult<()> {
        let lock = self.lock_for(paper_id);
        let result = {
            let _guard = lock.lock().await;
            let mut entry = self.load(paper_id).await.unwrap_or_default();
            entry.set(field, value.into());
            self.save(paper_id, &entry).await
        };
        self.release_lock(paper_id, lock);
        result?;

        debug!("已缓存 {} ({})", paper_id, field.as_str());
        Ok(())
    }

    /// 读取单个字段
    pub async fn load_field(&self, paper_id: &str, field: CachedField) -> Option<String> {
        self.load(paper_id)
            .await
            .and_then(|entry| entry.get(field).map(str::to_string))
    }

    fn lock_for(&self, paper_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.lock_table()
            .entry(paper_id.to_string())
            .or_default()
            .clone()
    }

    /// 没有其他等待者时移除该 ID 的锁
    fn release_lock(&self, paper_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.lock_table();
        // 表内一份 + 本调用一份
        let is_current = locks
            .get(paper_id)
            .is_some_and(|current| Arc::ptr_eq(current, &lock));
        if is_current && Arc::strong_count(&lock) <= 2 {
            locks.remove(paper_id);
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.lock_table().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, PaperCache) {
        let dir = TempDir::new().unwrap();
        let cache = PaperCache::open(dir.path().join("cache")).await.unwrap();
        (dir, cache)
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let (_dir, cache) = open_temp().await;
        assert!(cache.load("2401.0001").await.is_none());
    }

    #[tokio::test]
    async fn test_store_field_keeps_siblings() {
        let (_dir, cache) = open_temp().await;
        cache
            .store_field("2401.0001", CachedField::Content, "full text")
            .await
            .unwrap();
        cache
            .store_field("2401.0001", CachedField::Analysis, "analysis")
            .await
            .unwrap();
        cache
            .store_field("2401.0001", CachedField::Score, "{\"score_global\": 7}")
            .await
            .unwrap();

        let entry = cache.load("2401.0001").await.unwrap();
        assert_eq!(entry.get(CachedField::Content), Some("full text"));
        assert_eq!(entry.get(CachedField::Analysis), Some("analysis"));
        assert_eq!(entry.get(CachedField::Score), Some("{\"score_global\": 7}"));
    }

    #[tokio::test]
    async fn test_unknown_fields_survive_rewrite() {
        let (_dir, cache) = open_temp().await;
        std::fs::write(
            cache.entry_path("2401.0002"),
            r#"{"content": "text", "source": "legacy"}"#,
        )
        .unwrap();

        cache
            .store_field("2401.0002", CachedField::Analysis, "a")
            .await
            .unwrap();

        let entry = cache.load("2401.0002").await.unwrap();
        assert_eq!(entry.get(CachedField::Content), Some("text"));
        assert_eq!(entry.raw("source"), Some(&JsonValue::from("legacy")));
    }

    #[tokio::test]
    async fn test_mistyped_field_does_not_hide_siblings() {
        let (_dir, cache) = open_temp().await;
        std::fs::write(
            cache.entry_path("2401.0005"),
            r#"{"content": "cached body", "analysis": 42, "note": "keep"}"#,
        )
        .unwrap();

        assert_eq!(
            cache.load_field("2401.0005", CachedField::Content).await.as_deref(),
            Some("cached body")
        );
        assert!(cache
            .load_field("2401.0005", CachedField::Analysis)
            .await
            .is_none());

        cache
            .store_field("2401.0005", CachedField::Analysis, "fresh analysis")
            .await
            .unwrap();

        let entry = cache.load("2401.0005").await.unwrap();
        assert_eq!(entry.get(CachedField::Content), Some("cached body"));
        assert_eq!(entry.get(CachedField::Analysis), Some("fresh analysis"));
        assert_eq!(entry.raw("note"), Some(&JsonValue::from("keep")));
    }

    #[tokio::test]
    async fn test_non_object_entry_is_miss() {
        let (_dir, cache) = open_temp().await;
        std::fs::write(cache.entry_path("2401.0006"), "[1, 2, 3]").unwrap();
        assert!(cache.load("2401.0006").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss_and_recoverable() {
        let (_dir, cache) = open_temp().await;
        std::fs::write(cache.entry_path("2401.0003"), "{not json").unwrap();

        assert!(cache.load("2401.0003").await.is_none());

        cache
            .store_field("2401.0003", CachedField::Score, "{}")
            .await
            .unwrap();
        assert_eq!(
            cache.load_field("2401.0003", CachedField::Score).await.as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_same_id_merge() {
        let (_dir, cache) = open_temp().await;
        let cache = Arc::new(cache);

        let a = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .store_field("2401.0004", CachedField::Content, "c")
                    .await
            })
        };
        let b = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .store_field("2401.0004", CachedField::Analysis, "a")
                    .await
            })
        };
        tokio_test::assert_ok!(a.await.unwrap());
        tokio_test::assert_ok!(b.await.unwrap());

        let entry = cache.load("2401.0004").await.unwrap();
        assert_eq!(entry.get(CachedField::Content), Some("c"));
        assert_eq!(entry.get(CachedField::Analysis), Some("a"));
        assert_eq!(cache.lock_count(), 0);
    }
}

//! 带缓存的 LLM 生成
//!
//! 分析与打分阶段共用：命中缓存时不调用 LLM，未命中时生成并合并写入缓存

use std::future::Future;

use crate::error::AppResult;
use crate::infrastructure::{CachedField, PaperCache};

/// 生成结果来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// 来自缓存
    Cached(String),
    /// 新生成并已写入缓存
    Fresh(String),
}

impl Generated {
    pub fn into_text(self) -> String {
        match self {
            Generated::Cached(text) | Generated::Fresh(text) => text,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Generated::Cached(_))
    }
}

/// 读取缓存字段，未命中时调用 `generate` 并持久化结果
///
/// `generate` 的错误原样向上传播
pub async fn cached_or_generate<F, Fut>(
    cache: &PaperCache,
    paper_id: &str,
    field: CachedField,
    generate: F,
) -> AppResult<Generated>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<String>>,
{
    if let Some(text) = cache.load_field(paper_id, field).await {
        return Ok(Generated::Cached(text));
    }

    let text = generate().await?;
    cache.store_field(paper_id, field, text.as_str()).await?;
    Ok(Generated::Fresh(text))
}

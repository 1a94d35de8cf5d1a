//! 全文获取阶段
//!
//! 每篇论文独立处理：缓存命中直接复用；否则下载 PDF 并提取文本。
//! 单篇失败只记录日志，不影响整个批次

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::{CachedField, PaperCache};
use crate::models::{BatchState, FetchStats, Paper, StageProgress};
use crate::services::ContentSource;
use crate::utils::logging::log_fetch_stats;
use crate::workflow::stage::Stage;

/// 单篇论文的获取结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchOutcome {
    CacheHit,
    Downloaded,
    MissingPdf,
    Failed,
}

pub struct ContentStage {
    cache: Arc<PaperCache>,
    content: Arc<dyn ContentSource>,
}

impl ContentStage {
    pub fn new(cache: Arc<PaperCache>, content: Arc<dyn ContentSource>) -> Self {
        Self { cache, content }
    }

    async fn fetch_one(&self, paper: &mut Paper) -> FetchOutcome {
        if let Some(content) = self.cache.load_field(&paper.id, CachedField::Content).await {
            info!("⚡ 缓存命中: {} (content)", paper.id);
            paper.content = Some(content);
            return FetchOutcome::CacheHit;
        }

        let Some(pdf_url) = paper.pdf_url.clone() else {
            warn!("⚠️ 没有找到 PDF: {}", paper.id);
            return FetchOutcome::MissingPdf;
        };

        match self.download_text(&pdf_url).await {
            Ok(text) => {
                if let Err(e) = self
                    .cache
                    .store_field(&paper.id, CachedField::Content, text.as_str())
                    .await
                {
                    warn!("⚠️ 全文缓存写入失败 {}: {}", paper.id, e);
                }
                paper.content = Some(text);
                FetchOutcome::Downloaded
            }
            Err(e) => {
                error!("❌ 无法获取 PDF {}: {}", paper.id, e);
                FetchOutcome::Failed
            }
        }
    }

    async fn download_text(&self, pdf_url: &str) -> AppResult<String> {
        let bytes = self.content.download(pdf_url).await?;
        self.content.extract_text(&bytes)
    }
}

#[async_trait]
impl Stage for ContentStage {
    fn name(&self) -> &'static str {
        "fetch_content"
    }

    fn requires(&self) -> StageProgress {
        StageProgress::Searched
    }

    fn completes(&self) -> StageProgress {
        StageProgress::ContentFetched
    }

    async fn run(&self, state: &mut BatchState) -> AppResult<()> {
        info!("📥 正在获取 PDF 全文...");
        let mut stats = FetchStats {
            total: state.raw_papers.len(),
            ..Default::default()
        };

        for paper in state.raw_papers.iter_mut() {
            match self.fetch_one(paper).await {
                FetchOutcome::CacheHit => stats.cache_hits += 1,
                FetchOutcome::Downloaded => stats.downloaded += 1,
                FetchOutcome::MissingPdf => stats.missing_pdf += 1,
                FetchOutcome::Failed => stats.failures += 1,
            }
        }

        log_fetch_stats(&stats);
        state.fetch_stats = stats;
        Ok(())
    }
}

//! 搜索阶段
//!
//! 按提交时间检索最新论文，只保留白名单分类且位于时间窗口内的条目

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{BatchState, Paper, StageProgress};
use crate::services::{PaperSearch, SearchQuery, SortOrder};
use crate::workflow::stage::Stage;

/// 由分类构建查询表达式，如 `(cat:cs.CL OR cat:cs.AI)`
pub fn build_query(categories: &[String]) -> String {
    let parts: Vec<String> = categories.iter().map(|c| format!("cat:{}", c)).collect();
    format!("({})", parts.join(" OR "))
}

pub struct SearchStage {
    search: Arc<dyn PaperSearch>,
    categories: Vec<String>,
    window: Duration,
    max_results: usize,
}

impl SearchStage {
    pub fn new(search: Arc<dyn PaperSearch>, config: &Config) -> Self {
        Self {
            search,
            categories: config.categories.clone(),
            window: config.recency_window(),
            max_results: config.search_max_results,
        }
    }
}

#[async_trait]
impl Stage for SearchStage {
    fn name(&self) -> &'static str {
        "search"
    }

    fn requires(&self) -> StageProgress {
        StageProgress::Created
    }

    fn completes(&self) -> StageProgress {
        StageProgress::Searched
    }

    async fn run(&self, state: &mut BatchState) -> AppResult<()> {
        info!("🔍 正在搜索 arXiv...");
        // 时间窗口按调用时刻计算
        let window_start = Utc::now() - self.window;

        if state.query.trim().is_empty() {
            state.query = build_query(&self.categories);
        }

        let hits = self
            .search
            .search(&SearchQuery {
                query: state.query.clone(),
                max_results: self.max_results,
                sort: SortOrder::SubmittedDate,
            })
            .await?;
        info!("搜索返回 {} 条结果", hits.len());

        let allowed: HashSet<&str> = self.categories.iter().map(String::as_str).collect();
        state.raw_papers = hits
            .into_iter()
            .filter(|hit| allowed.contains(hit.primary_category.as_str()))
            .filter(|hit| hit.published_at >= window_start)
            .map(Paper::from_hit)
            .collect();

        info!("✓ 符合条件的论文: {} 篇", state.raw_papers.len());
        Ok(())
    }
}

//! 批次状态
//!
//! 在阶段之间传递的容器，每个阶段只写自己的集合

use std::fmt::Display;

use crate::models::paper::Paper;

/// 批次所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageProgress {
    /// 刚创建，只有查询
    Created,
    /// 搜索完成（raw_papers）
    Searched,
    /// 全文获取完成（raw_papers 带 content）
    ContentFetched,
    /// 分析完成（analyzed）
    Analyzed,
    /// 打分完成（scored）
    Scored,
    /// 帖子生成完成（post / top_papers）
    Published,
}

impl Display for StageProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StageProgress::Created => "created",
            StageProgress::Searched => "searched",
            StageProgress::ContentFetched => "content_fetched",
            StageProgress::Analyzed => "analyzed",
            StageProgress::Scored => "scored",
            StageProgress::Published => "published",
        };
        f.write_str(name)
    }
}

/// 全文获取统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub total: usize,
    pub cache_hits: usize,
    pub downloaded: usize,
    pub missing_pdf: usize,
    pub failures: usize,
}

/// LLM 生成统计（分析、打分）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub total: usize,
    pub cache_hits: usize,
    pub generated: usize,
}

/// 批次状态
#[derive(Debug, Clone)]
pub struct BatchState {
    /// 搜索查询，空串表示按配置的分类构建
    pub query: String,
    pub progress: StageProgress,

    pub raw_papers: Vec<Paper>,
    pub analyzed: Vec<Paper>,
    pub scored: Vec<Paper>,
    /// 生成的帖子，没有可用论文时为空串
    pub post: String,
    pub top_papers: Vec<Paper>,

    pub fetch_stats: FetchStats,
    pub analysis_stats: GenerationStats,
    pub score_stats: GenerationStats,
}

impl BatchState {
    /// 创建新的批次
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            progress: StageProgress::Created,
            raw_papers: Vec::new(),
            analyzed: Vec::new(),
            scored: Vec::new(),
            post: String::new(),
            top_papers: Vec::new(),
            fetch_stats: FetchStats::default(),
            analysis_stats: GenerationStats::default(),
            score_stats: GenerationStats::default(),
        }
    }
}

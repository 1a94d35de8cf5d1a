//! 分析阶段
//!
//! 每篇论文调用一次 LLM 生成分析；LLM 失败会终止本次运行

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{CachedField, PaperCache};
use crate::models::{BatchState, GenerationStats, StageProgress};
use crate::services::{Completion, PromptLibrary};
use crate::utils::logging::log_generation_stats;
use crate::workflow::generation::cached_or_generate;
use crate::workflow::stage::Stage;

pub struct AnalysisStage {
    cache: Arc<PaperCache>,
    llm: Arc<dyn Completion>,
    prompts: Arc<PromptLibrary>,
    temperature: f32,
    max_content_chars: usize,
}

impl AnalysisStage {
    pub fn new(
        cache: Arc<PaperCache>,
        llm: Arc<dyn Completion>,
        prompts: Arc<PromptLibrary>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            llm,
            prompts,
            temperature: config.analysis_temperature,
            max_content_chars: config.content_excerpt_chars,
        }
    }
}

#[async_trait]
impl Stage for AnalysisStage {
    fn name(&self) -> &'static str {
        "analyze"
    }

    fn requires(&self) -> StageProgress {
        StageProgress::ContentFetched
    }

    fn completes(&self) -> StageProgress {
        StageProgress::Analyzed
    }

    async fn run(&self, state: &mut BatchState) -> AppResult<()> {
        info!("🧠 正在分析论文...");
        let mut stats = GenerationStats {
            total: state.raw_papers.len(),
            ..Default::default()
        };
        let mut analyzed = Vec::with_capacity(state.raw_papers.len());

        for paper in &state.raw_papers {
            let (llm, prompts) = (&self.llm, &self.prompts);
            let (temperature, max_chars) = (self.temperature, self.max_content_chars);
            let generated = cached_or_generate(
                &self.cache,
                &paper.id,
                CachedField::Analysis,
                move || async move {
                    info!("🔍 LLM 分析: {}", paper.id);
                    let prompt = prompts.analysis_prompt(paper, max_chars);
                    llm.complete(&prompt, temperature).await
                },
            )
            .await?;

            let mut paper = paper.clone();

            if generated.is_cached() {
                info!("⚡ 缓存命中: {} (analysis)", paper.id);
                stats.cache_hits += 1;
            } else {
                stats.generated += 1;
            }
            paper.analysis = Some(generated.into_text());
            analyzed.push(paper);
        }

        log_generation_stats("分析", &stats);
        state.analyzed = analyzed;
        state.analysis_stats = stats;
        Ok(())
    }
}

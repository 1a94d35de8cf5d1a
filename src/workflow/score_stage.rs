//! 打分阶段
//!
//! 基于分析文本与评审指南请求 LLM 打分，原始文本原样缓存，校验推迟到排序

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

pub struct ScoreStage {
    cache: Arc<PaperCache>,
    llm: Arc<dyn Completion>,
    prompts: Arc<PromptLibrary>,
    temperature: f32,
}

impl ScoreStage {
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
        }
    }
}

#[async_trait]
impl Stage for ScoreStage {
    fn name(&self) -> &'static str {
        "score"
    }

    fn requires(&self) -> StageProgress {
        StageProgress::Analyzed
    }

    fn completes(&self) -> StageProgress {
        StageProgress::Scored
    }

    async fn run(&self, state: &mut BatchState) -> AppResult<()> {
        info!("🏷️ 正在为论文打分...");
        let mut stats = GenerationStats {
            total: state.analyzed.len(),
            ..Default::default()
        };
        let mut scored = Vec::with_capacity(state.analyzed.len());

        for paper in &state.analyzed {
            let (llm, prompts, temperature) = (&self.llm, &self.prompts, self.temperature);
            let generated = cached_or_generate(
                &self.cache,
                &paper.id,
                CachedField::Score,
                move || async move {
                    info!("🏷️ LLM 打分: {}", paper.id);
                    let analysis = paper.analysis.as_deref().unwrap_or_default();
                    let prompt = prompts.score_prompt(analysis);
                    llm.complete(&prompt, temperature).await
                },
            )
            .await?;

            let mut paper = paper.clone();

            if generated.is_cached() {
                info!("⚡ 缓存命中: {} (score)", paper.id);
                stats.cache_hits += 1;
            } else {
                stats.generated += 1;
            }
            paper.score = Some(generated.into_text());
            scored.push(paper);
        }

        log_generation_stats("打分", &stats);
        state.scored = scored;
        state.score_stats = stats;
        Ok(())
    }
}

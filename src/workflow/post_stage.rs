//! 帖子生成阶段
//!
//! 对打分结果排序，取前 N 篇渲染简报，以对话方式生成一篇帖子。
//! 没有可用论文时直接产出空帖子，不调用 LLM

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{BatchState, StageProgress};
use crate::services::{top_papers, ChatTurn, Completion, PromptLibrary};
use crate::workflow::stage::Stage;

pub struct PostStage {
    llm: Arc<dyn Completion>,
    prompts: Arc<PromptLibrary>,
    language: String,
    temperature: f32,
    top_n: usize,
    window_hours: u64,
    repo_url: String,
    excerpt_chars: usize,
}

impl PostStage {
    pub fn new(llm: Arc<dyn Completion>, prompts: Arc<PromptLibrary>, config: &Config) -> Self {
        Self {
            llm,
            prompts,
            language: config.post_language.clone(),
            temperature: config.post_temperature,
            top_n: config.top_n,
            window_hours: config.recency_window_hours,
            repo_url: config.repo_url.clone(),
            excerpt_chars: config.brief_excerpt_chars,
        }
    }
}

#[async_trait]
impl Stage for PostStage {
    fn name(&self) -> &'static str {
        "write_post"
    }

    fn requires(&self) -> StageProgress {
        StageProgress::Scored
    }

    fn completes(&self) -> StageProgress {
        StageProgress::Published
    }

    async fn run(&self, state: &mut BatchState) -> AppResult<()> {
        info!("✍️ 正在撰写帖子...");
        let top = top_papers(&state.scored, self.top_n);
        if top.is_empty() {
            warn!("⚠️ 没有可用于帖子的论文");
            state.post = String::new();
            state.top_papers = Vec::new();
            return Ok(());
        }

        let user_prompt = self.prompts.post_prompt(
            &top,
            &self.language,
            self.window_hours,
            &self.repo_url,
            self.excerpt_chars,
        );
        let turns = [
            ChatTurn::system(self.prompts.post_system()),
            ChatTurn::user(user_prompt),
        ];

        let post = self.llm.complete_chat(&turns, self.temperature).await?;
        info!("✓ 帖子生成完成 ({} 篇论文)", top.len());

        state.post = post;
        state.top_papers = top;
        Ok(())
    }
}

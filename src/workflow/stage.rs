//! 阶段接口
//!
//! 每个阶段声明自己需要的批次状态与完成后的批次状态，由流水线校验顺序

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::infrastructure::PaperCache;
use crate::models::{BatchState, StageProgress};
use crate::services::{Completion, ContentSource, PaperSearch, PromptLibrary};

/// 流水线阶段
#[async_trait]
pub trait Stage: Send + Sync {
    /// 阶段名（用于日志）
    fn name(&self) -> &'static str;

    /// 运行前批次必须处于的状态
    fn requires(&self) -> StageProgress;

    /// 运行后批次进入的状态
    fn completes(&self) -> StageProgress;

    /// 处理整个批次，只写本阶段负责的集合
    async fn run(&self, state: &mut BatchState) -> AppResult<()>;
}

/// 各阶段共享的外部能力
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<PaperCache>,
    pub search: Arc<dyn PaperSearch>,
    pub content: Arc<dyn ContentSource>,
    pub llm: Arc<dyn Completion>,
    pub prompts: Arc<PromptLibrary>,
}

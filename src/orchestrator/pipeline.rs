//! 流水线 - 编排层
//!
//! 按顺序运行各阶段。每个阶段运行前校验批次状态，
//! 顺序不对时返回 [`PipelineError::StageOutOfOrder`]，不会运行该阶段

use tracing::info;

use crate::config::Config;
use crate::error::{AppResult, PipelineError};
use crate::models::BatchState;
use crate::utils::logging::log_stage_start;
use crate::workflow::{
    AnalysisStage, Collaborators, ContentStage, PostStage, ScoreStage, SearchStage, Stage,
};

/// 阶段序列
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// 创建空流水线
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个阶段
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// 标准流程：搜索 → 全文 → 分析 → 打分 → 帖子
    pub fn standard(config: &Config, deps: &Collaborators) -> Self {
        Self::new()
            .with_stage(SearchStage::new(deps.search.clone(), config))
            .with_stage(ContentStage::new(deps.cache.clone(), deps.content.clone()))
            .with_stage(AnalysisStage::new(
                deps.cache.clone(),
                deps.llm.clone(),
                deps.prompts.clone(),
                config,
            ))
            .with_stage(ScoreStage::new(
                deps.cache.clone(),
                deps.llm.clone(),
                deps.prompts.clone(),
                config,
            ))
            .with_stage(PostStage::new(deps.llm.clone(), deps.prompts.clone(), config))
    }

    /// 从新批次开始运行所有阶段
    ///
    /// # 参数
    /// - `query`: 搜索查询，空串表示按配置的分类构建
    ///
    /// # 返回
    /// 最终批次状态；任一阶段失败即终止并返回该错误
    pub async fn run(&self, query: &str) -> AppResult<BatchState> {
        let mut state = BatchState::new(query);
        self.resume(&mut state).await?;
        Ok(state)
    }

    /// 在已有批次上继续运行所有阶段
    pub async fn resume(&self, state: &mut BatchState) -> AppResult<()> {
        for stage in &self.stages {
            if state.progress != stage.requires() {
                return Err(PipelineError::StageOutOfOrder {
                    stage: stage.name().to_string(),
                    expected: stage.requires().to_string(),
                    found: state.progress.to_string(),
                }
                .into());
            }

            log_stage_start(stage.name());
            stage.run(state).await?;
            state.progress = stage.completes();
            info!("✓ 阶段 {} 完成 → {}", stage.name(), state.progress);
        }
        Ok(())
    }
}

//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建各客户端、打开缓存、加载提示词
//! 2. **运行流水线**：搜索 → 全文 → 分析 → 打分 → 帖子
//! 3. **结果输出**：打印排序结果与帖子
//!
//! 只有本模块持有具体的客户端类型，下层只看到能力 trait

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::clients::{ArxivClient, LlmClient, PdfClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PaperCache;
use crate::models::BatchState;
use crate::orchestrator::pipeline::Pipeline;
use crate::services::{collect_scored_papers, PromptLibrary};
use crate::utils::logging::{log_startup, print_post, print_ranked_papers};
use crate::workflow::Collaborators;

/// 搜索请求超时
const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// 应用主结构
pub struct App {
    pipeline: Pipeline,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let search = ArxivClient::new(SEARCH_TIMEOUT)?;
        let content = PdfClient::new(Duration::from_secs(config.download_timeout_secs))?;
        let llm = LlmClient::new(&config);
        let cache = PaperCache::open(&config.cache_dir).await?;
        let prompts = PromptLibrary::load(&config.prompts_dir).await;
        info!(
            "📝 已加载 {} 条评审指南",
            prompts
                .guidelines()
                .iter()
                .filter(|g| !g.text.is_empty())
                .count()
        );

        let deps = Collaborators {
            cache: Arc::new(cache),
            search: Arc::new(search),
            content: Arc::new(content),
            llm: Arc::new(llm),
            prompts: Arc::new(prompts),
        };

        Ok(Self::with_collaborators(&config, &deps))
    }

    /// 使用给定的能力实现组装应用
    pub fn with_collaborators(config: &Config, deps: &Collaborators) -> Self {
        Self {
            pipeline: Pipeline::standard(config, deps),
        }
    }

    /// 运行一次完整流程并打印结果
    ///
    /// # 参数
    /// - `query`: 搜索查询，空串表示按配置的分类构建
    pub async fn run(&self, query: &str) -> AppResult<BatchState> {
        let state = self.pipeline.run(query).await?;

        let ranked = collect_scored_papers(&state.scored);
        print_ranked_papers(&ranked);
        print_post(&state.post);

        info!(
            "🏁 完成 - 论文: {}, 进入帖子: {}",
            state.scored.len(),
            state.top_papers.len()
        );
        Ok(state)
    }
}

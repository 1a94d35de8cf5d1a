//! # arXiv Curator
//!
//! 每日 arXiv 论文筛选：搜索近期论文、获取全文、由 LLM 分析打分，并生成一篇排名帖子
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有持久化资源，只暴露能力
//! - `PaperCache` - 每篇论文一个 JSON 文件，按字段合并写入，同一论文的读改写串行化
//!
//! ### ② 外部客户端（Clients）
//! - `ArxivClient` - arXiv Atom 搜索
//! - `PdfClient` - PDF 下载与文本提取
//! - `LlmClient` - OpenAI 兼容的补全接口（含重试）
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PaperSearch` / `ContentSource` / `Completion` - 能力 trait，测试中可替换为桩
//! - `PromptLibrary` - 评审指南与提示词构建
//! - `ranking` - 打分解析、排序与简报渲染
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义每个阶段对整个批次的处理
//! - `SearchStage` → `ContentStage` → `AnalysisStage` → `ScoreStage` → `PostStage`
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 校验阶段顺序并依次运行
//! - `orchestrator/runner` - 组装依赖，输出结果
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CachedField, PaperCache};
pub use models::{BatchState, Paper, StageProgress};
pub use orchestrator::{App, Pipeline};
pub use workflow::{Collaborators, Stage};

//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责组装依赖和调度阶段，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `runner` - 应用入口
//! - 创建 arXiv / PDF / LLM 客户端
//! - 打开论文缓存，加载提示词
//! - 运行流水线，打印排序结果与帖子
//!
//! ### `pipeline` - 流水线
//! - 持有有序的阶段列表
//! - 运行前校验批次状态，顺序不对立即报错
//! - 任一阶段失败即终止
//!
//! ## 层次关系
//!
//! ```text
//! runner (App)
//!     ↓
//! pipeline (Vec<Box<dyn Stage>>)
//!     ↓
//! workflow (search / content / analyze / score / post)
//!     ↓
//! services (能力 trait、提示词、排序)
//!     ↓
//! infrastructure (PaperCache) / clients (arXiv、PDF、LLM)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有具体客户端
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和输出

pub mod pipeline;
pub mod runner;

pub use pipeline::Pipeline;
pub use runner::App;

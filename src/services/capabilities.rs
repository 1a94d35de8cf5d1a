//! 外部能力接口
//!
//! 流程只依赖这些 trait，具体实现位于 `clients/`，测试中可替换为桩

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;

/// 搜索排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// 按提交时间，最新在前
    #[default]
    SubmittedDate,
}

impl SortOrder {
    /// arXiv 接口的 `sortBy` 参数值
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::SubmittedDate => "submittedDate",
        }
    }
}

/// 搜索请求
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    pub sort: SortOrder,
}

/// 搜索返回的论文元数据
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub primary_category: String,
    pub abstract_text: String,
    pub entry_url: String,
    pub pdf_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub authors: Vec<String>,
}

/// 论文搜索能力
#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// 按查询返回论文元数据，顺序与数据源排序一致
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<SearchHit>>;
}

/// 全文获取能力
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// 下载原始字节，非 2xx 或超时返回传输错误
    async fn download(&self, url: &str) -> AppResult<Vec<u8>>;

    /// 从字节中提取文本
    fn extract_text(&self, bytes: &[u8]) -> AppResult<String>;
}

/// 对话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// 一轮对话
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// 文本补全能力
#[async_trait]
pub trait Completion: Send + Sync {
    /// 单条提示词补全
    async fn complete(&self, prompt: &str, temperature: f32) -> AppResult<String>;

    /// 多轮对话补全
    async fn complete_chat(&self, turns: &[ChatTurn], temperature: f32) -> AppResult<String>;
}

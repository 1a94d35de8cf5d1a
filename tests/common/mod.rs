//! 集成测试共用的桩实现
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use arxiv_curator::config::Config;
use arxiv_curator::error::{AppError, AppResult, CompletionError};
use arxiv_curator::infrastructure::PaperCache;
use arxiv_curator::services::{
    ChatTurn, Completion, ContentSource, PaperSearch, PromptLibrary, SearchHit, SearchQuery,
};
use arxiv_curator::workflow::Collaborators;
use async_trait::async_trait;
use chrono::{Duration, Utc};

/// 返回固定结果的搜索
pub struct StubSearch {
    pub hits: Vec<SearchHit>,
    pub queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaperSearch for StubSearch {
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.query.clone());
        Ok(self.hits.clone())
    }
}

/// 按 URL 返回文本的全文源，未登记的 URL 返回 404
pub struct StubContent {
    pub documents: HashMap<String, String>,
    pub downloads: Mutex<Vec<String>>,
}

impl StubContent {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            downloads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_document(mut self, url: &str, text: &str) -> Self {
        self.documents.insert(url.to_string(), text.to_string());
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentSource for StubContent {
    async fn download(&self, url: &str) -> AppResult<Vec<u8>> {
        self.downloads.lock().unwrap().push(url.to_string());
        self.documents
            .get(url)
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| AppError::bad_status(url, 404))
    }

    fn extract_text(&self, bytes: &[u8]) -> AppResult<String> {
        String::from_utf8(bytes.to_vec()).map_err(AppError::pdf_parse_failed)
    }
}

/// 按关键字应答的补全桩
///
/// 提示词包含某条规则的关键字时返回对应应答，按登记顺序匹配；
/// 都不匹配时返回 `fallback`，`fallback` 为 None 时返回错误
pub struct StubCompletion {
    rules: Vec<(String, String)>,
    fallback: Option<String>,
    chat_response: String,
    pub calls: Mutex<Vec<String>>,
    pub chat_calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl StubCompletion {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Some("generic answer".to_string()),
            chat_response: "generated post".to_string(),
            calls: Mutex::new(Vec::new()),
            chat_calls: Mutex::new(Vec::new()),
        }
    }

    /// 所有单条补全都失败
    pub fn failing() -> Self {
        Self {
            fallback: None,
            ..Self::new()
        }
    }

    pub fn on(mut self, needle: &str, response: &str) -> Self {
        self.rules.push((needle.to_string(), response.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn chat_count(&self) -> usize {
        self.chat_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Completion for StubCompletion {
    async fn complete(&self, prompt: &str, _temperature: f32) -> AppResult<String> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some((_, response)) = self.rules.iter().find(|(needle, _)| prompt.contains(needle)) {
            return Ok(response.clone());
        }
        self.fallback.clone().ok_or_else(|| {
            AppError::Completion(CompletionError::EmptyContent {
                model: "stub".to_string(),
            })
        })
    }

    async fn complete_chat(&self, turns: &[ChatTurn], _temperature: f32) -> AppResult<String> {
        self.chat_calls.lock().unwrap().push(turns.to_vec());
        Ok(self.chat_response.clone())
    }
}

/// 构造一条 arXiv 搜索结果
///
/// # 参数
/// - `id`: 论文标识，URL 以其结尾
/// - `category`: 主分类
/// - `hours_ago`: 距今的发布小时数
pub fn hit(id: &str, title: &str, category: &str, hours_ago: i64) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        primary_category: category.to_string(),
        abstract_text: format!("Abstract of {title}"),
        entry_url: format!("http://arxiv.org/abs/{id}"),
        pdf_url: Some(pdf_url(id)),
        published_at: Utc::now() - Duration::hours(hours_ago),
        authors: vec!["Ada Lovelace".to_string()],
    }
}

pub fn pdf_url(id: &str) -> String {
    format!("http://arxiv.org/pdf/{id}")
}

/// 测试配置：只保留 cs.AI，缓存写到给定目录
pub fn test_config(cache_dir: &Path) -> Config {
    Config {
        categories: vec!["cs.AI".to_string()],
        cache_dir: cache_dir.to_path_buf(),
        llm_api_key: "test-key".to_string(),
        ..Config::default()
    }
}

pub async fn collaborators(
    config: &Config,
    search: Arc<StubSearch>,
    content: Arc<StubContent>,
    llm: Arc<StubCompletion>,
) -> Collaborators {
    let cache = PaperCache::open(&config.cache_dir)
        .await
        .expect("打开缓存失败");
    Collaborators {
        cache: Arc::new(cache),
        search,
        content,
        llm,
        prompts: Arc::new(PromptLibrary::default()),
    }
}
